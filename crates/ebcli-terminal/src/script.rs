//! Batch execution: inline command strings and script files.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use ebcli_types::error::{EbError, Result};

use crate::interpreter::{CommandRouter, Flow};

/// Feed `lines` to the router until one of them quits.
pub fn run_lines<I, S>(router: &mut CommandRouter, lines: I, out: &mut dyn Write) -> Result<Flow>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for line in lines {
        if router.execute_line(line.as_ref(), out)? == Flow::Quit {
            return Ok(Flow::Quit);
        }
    }
    Ok(Flow::Continue)
}

/// Run a `;`-separated command string.
pub fn run_inline(router: &mut CommandRouter, commands: &str, out: &mut dyn Write) -> Result<Flow> {
    run_lines(router, commands.split(';'), out)
}

/// Run a script file, one command per line. Lines are read as they run.
pub fn run_file(router: &mut CommandRouter, path: &Path, out: &mut dyn Write) -> Result<Flow> {
    let file = File::open(path).map_err(|e| {
        EbError::Io(io::Error::new(
            e.kind(),
            format!("cannot open script {}: {e}", path.display()),
        ))
    })?;
    log::info!("running script {}", path.display());

    for line in BufReader::new(file).lines() {
        if router.execute_line(&line?, out)? == Flow::Quit {
            return Ok(Flow::Quit);
        }
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::style::Style;
    use ebcli_net::MemoryConnector;
    use ebcli_types::target::Target;

    fn router() -> (CommandRouter, MemoryConnector) {
        let connector = MemoryConnector::new();
        let session = Session::open(
            Box::new(connector.clone()),
            Target::new("mem", 1234),
            None,
            false,
        )
        .unwrap();
        (
            CommandRouter::with_builtins(session.into_shared(), Style::plain()),
            connector,
        )
    }

    #[test]
    fn inline_runs_in_order() {
        let (mut r, _) = router();
        let mut out = Vec::new();
        let flow = run_inline(&mut r, "write 0x10 5; read 0x10 ;read 0x14", &mut out).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0x00000005\n0x00000005\n0x00000000\n"
        );
    }

    #[test]
    fn inline_stops_at_quit() {
        let (mut r, dev) = router();
        let mut out = Vec::new();
        let flow = run_inline(&mut r, "write 0x10 1;quit;write 0x10 2", &mut out).unwrap();
        assert_eq!(flow, Flow::Quit);
        assert_eq!(dev.device().borrow().writes, [(0x10, 1)]);
        assert!(r.is_terminated());
    }

    #[test]
    fn empty_segments_are_skipped() {
        let (mut r, _) = router();
        let mut out = Vec::new();
        assert_eq!(run_inline(&mut r, ";;  ;", &mut out).unwrap(), Flow::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn file_continues_past_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.txt");
        std::fs::write(&path, "# setup\nread 0x10 0x20\n\nwrite 0x10 3\nfrobnicate\nread 0x10\n")
            .unwrap();
        let (mut r, _) = router();
        let mut out = Vec::new();
        assert_eq!(run_file(&mut r, &path, &mut out).unwrap(), Flow::Continue);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Usage: read <addr>\n0x00000003\nUnknown command: frobnicate\n0x00000003\n"
        );
    }

    #[test]
    fn missing_script_is_fatal() {
        let (mut r, _) = router();
        let mut out = Vec::new();
        let err = run_file(&mut r, Path::new("/no/such/script.txt"), &mut out).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/no/such/script.txt"));
    }

    #[test]
    fn transport_failure_aborts_script() {
        let (mut r, dev) = router();
        dev.device().borrow_mut().fail_reads = true;
        let mut out = Vec::new();
        let err = run_inline(&mut r, "read 0x10; read 0x14", &mut out).unwrap_err();
        assert!(err.is_fatal());
        assert!(out.is_empty());
    }
}
