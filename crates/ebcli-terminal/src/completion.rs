//! Tab completion for the interactive console.

use std::path::Path;

use ebcli_types::config::expand_tilde;

use crate::session::SharedSession;

const WORD_DELIMITERS: [char; 2] = [' ', '\t'];

/// Verbs whose argument is a register name.
const REGISTER_VERBS: [&str; 3] = ["read", "write", "regs"];

/// Completes verbs, register names and csr file paths.
pub struct CompletionProvider {
    session: SharedSession,
    verbs: Vec<String>,
}

impl CompletionProvider {
    pub fn new(session: SharedSession, verbs: Vec<String>) -> Self {
        Self { session, verbs }
    }

    /// Completions for the word ending at `pos`.
    ///
    /// Returns the byte offset where the word starts and the replacement
    /// candidates for it.
    pub fn complete(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let before = line.get(..pos).unwrap_or(line);
        let start = before.rfind(WORD_DELIMITERS).map_or(0, |i| i + 1);
        (start, self.candidates(before, &before[start..]))
    }

    /// Candidates for `word`, given everything typed before the cursor.
    pub fn candidates(&self, buffer: &str, word: &str) -> Vec<String> {
        let buffer = buffer.trim_start();
        let mut tokens = buffer.splitn(2, WORD_DELIMITERS);
        let first = tokens.next().unwrap_or("");
        if tokens.next().is_none() {
            return self
                .verbs
                .iter()
                .filter(|v| v.starts_with(word))
                .cloned()
                .collect();
        }

        if first == "csr" {
            return complete_path(word);
        }
        if !REGISTER_VERBS.contains(&first) {
            return Vec::new();
        }
        // The router holds the session mutably while a command runs.
        let Ok(session) = self.session.try_borrow() else {
            return Vec::new();
        };
        session
            .map()
            .map(|map| {
                map.names_sorted()
                    .into_iter()
                    .filter(|n| n.starts_with(word))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Filesystem entries starting with `text`, sorted, directories with a
/// trailing `/`.
pub fn complete_path(text: &str) -> Vec<String> {
    let expanded = expand_tilde(text).to_string_lossy().into_owned();
    let (dir, prefix) = match expanded.rfind('/') {
        Some(i) => expanded.split_at(i + 1),
        None => ("", expanded.as_str()),
    };
    let search = if dir.is_empty() { "." } else { dir };
    let Ok(entries) = std::fs::read_dir(search) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.starts_with(prefix))
        .collect();
    names.sort();
    names
        .into_iter()
        .map(|name| {
            let is_dir = Path::new(search).join(&name).is_dir();
            let mut full = format!("{dir}{name}");
            if is_dir {
                full.push('/');
            }
            full
        })
        .collect()
}
