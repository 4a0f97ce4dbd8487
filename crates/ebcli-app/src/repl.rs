//! Interactive console on top of rustyline.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};

use ebcli_terminal::{CommandRouter, CompletionProvider, Flow};
use ebcli_types::config::CliConfig;

struct ReplHelper {
    provider: CompletionProvider,
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, found) = self.provider.complete(line, pos);
        let pairs = found
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

/// Owns the editor and writes its history back when dropped.
struct HistoryGuard {
    editor: Editor<ReplHelper, DefaultHistory>,
    path: PathBuf,
}

impl Drop for HistoryGuard {
    fn drop(&mut self) {
        match self.editor.save_history(&self.path) {
            Ok(()) => log::debug!("saved history to {}", self.path.display()),
            Err(e) => log::warn!("could not save history to {}: {e}", self.path.display()),
        }
    }
}

/// Build an editor bounded to `history_length` entries and load its history.
///
/// A missing history file is not an error. The returned guard writes the
/// history back when dropped.
fn history_editor(config: &CliConfig) -> Result<HistoryGuard> {
    let rl_config = Config::builder()
        .max_history_size(config.history_length)?
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .build();
    let mut editor: Editor<ReplHelper, DefaultHistory> = Editor::with_config(rl_config)?;

    let path = config.history_path();
    match editor.load_history(&path) {
        Ok(()) => log::debug!("loaded history from {}", path.display()),
        Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {},
        Err(e) => log::warn!("could not load history from {}: {e}", path.display()),
    }
    Ok(HistoryGuard { editor, path })
}

/// Read lines from the terminal until EOF, Ctrl-C or `quit`.
pub fn run(router: &mut CommandRouter, config: &CliConfig) -> Result<()> {
    let mut guard = history_editor(config)?;
    guard.editor.set_helper(Some(ReplHelper {
        provider: CompletionProvider::new(router.session(), router.verbs()),
    }));

    let style = *router.style();
    println!(
        "Interactive mode (type '{}' for commands, '{}' to exit)",
        style.bold("help"),
        style.bold("quit")
    );
    let prompt = format!("{} ", style.bold("ebcli>"));
    let mut out = io::stdout();

    loop {
        match guard.editor.readline(&prompt) {
            Ok(line) => {
                if router.execute_line(&line, &mut out)? == Flow::Quit {
                    break;
                }
            },
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                println!();
                break;
            },
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::{History, SearchDirection};
    use std::path::Path;

    fn config(path: &Path, history_length: usize) -> CliConfig {
        CliConfig {
            history_file: Some(path.to_path_buf()),
            history_length,
            ..CliConfig::default()
        }
    }

    fn entries(guard: &HistoryGuard) -> Vec<String> {
        let history = guard.editor.history();
        (0..history.len())
            .filter_map(|i| history.get(i, SearchDirection::Forward).unwrap())
            .map(|r| r.entry.into_owned())
            .collect()
    }

    #[test]
    fn missing_history_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let guard = history_editor(&config(&path, 1000)).unwrap();
        assert!(entries(&guard).is_empty());
    }

    #[test]
    fn drop_saves_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        {
            let mut guard = history_editor(&config(&path, 1000)).unwrap();
            guard.editor.add_history_entry("read 0x10").unwrap();
            guard.editor.add_history_entry("regs tx_*").unwrap();
        }
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("read 0x10"));
        assert!(saved.contains("regs tx_*"));

        let guard = history_editor(&config(&path, 1000)).unwrap();
        assert_eq!(entries(&guard), ["read 0x10", "regs tx_*"]);
    }

    #[test]
    fn history_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        {
            let mut guard = history_editor(&config(&path, 1000)).unwrap();
            for line in ["read 0x0", "read 0x4", "read 0x8"] {
                guard.editor.add_history_entry(line).unwrap();
            }
        }
        let guard = history_editor(&config(&path, 2)).unwrap();
        assert_eq!(entries(&guard), ["read 0x4", "read 0x8"]);
    }

    #[test]
    fn history_saved_on_error_path() {
        fn session_that_fails(config: &CliConfig) -> Result<()> {
            let mut guard = history_editor(config)?;
            guard.editor.add_history_entry("write 0x0 1")?;
            anyhow::bail!("transport error: no reply");
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        assert!(session_that_fails(&config(&path, 1000)).is_err());
        assert!(std::fs::read_to_string(&path).unwrap().contains("write 0x0 1"));
    }
}
