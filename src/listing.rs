//! Parser for `ls -la` lines produced by the device shell
//!
//! Both listing flavours shipped on Android are understood:
//!
//! ```text
//! toolbox: -rw-rw---- root sdcard_rw 1024 2014-03-02 11:05 notes.txt
//!          drwxrwx--x root sdcard_rw      2014-03-02 11:05 DCIM
//! toybox:  -rw-rw---- 1 u0_a12 media_rw 1024 2019-07-14 09:31 notes.txt
//! ```
//!
//! The layout is picked from the number of fields between the permissions
//! and the timestamp. Everything after the `HH:MM` field is the name, spaces
//! included.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;

use crate::entry::{EntryKind, EntryRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const MIN_PERMISSIONS_LEN: usize = 10;

/// A whitespace-delimited field and its byte offset in the line
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    start: usize,
    text: &'a str,
}

impl Token<'_> {
    fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    start: s,
                    text: &line[s..i],
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            start: s,
            text: &line[s..],
        });
    }
    tokens
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYY-MM-DD`
fn looks_like_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

/// `HH:MM`
fn looks_like_time(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && b[2] == b':'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 2 || c.is_ascii_digit())
}

/// Parse one listing line into an [`EntryRecord`].
///
/// Returns an error for anything that is not a readable regular file or
/// directory in one of the known layouts. Callers drop such lines and keep
/// going.
pub fn parse_line(line: &str) -> Result<EntryRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    let tokens = tokenize(line);

    let permissions = tokens.first().ok_or_else(|| anyhow!("empty line"))?.text;
    if permissions.chars().count() < MIN_PERMISSIONS_LEN {
        bail!("permissions field too short: {permissions:?}");
    }
    if permissions.as_bytes().get(1) != Some(&b'r') {
        bail!("entry is not readable: {permissions}");
    }
    let kind = EntryKind::from_permissions(permissions);
    if kind == EntryKind::Other {
        bail!("unsupported entry type: {permissions}");
    }

    // Owner and group are at least two fields, links and size at most two more.
    let ts_index = (3..=5)
        .find(|&i| {
            tokens.get(i).is_some_and(|t| looks_like_date(t.text))
                && tokens.get(i + 1).is_some_and(|t| looks_like_time(t.text))
        })
        .ok_or_else(|| anyhow!("no YYYY-MM-DD HH:MM timestamp in expected position"))?;

    let (owner, group, size_field) = match &tokens[1..ts_index] {
        [owner, group] => (owner, group, None),
        [owner, group, size] => (owner, group, Some(size)),
        [links, owner, group, size] if is_digits(links.text) => (owner, group, Some(size)),
        _ => bail!("unrecognised field layout"),
    };

    let size = size_field
        .map(|t| {
            t.text
                .parse::<u64>()
                .with_context(|| format!("invalid size field {:?}", t.text))
        })
        .transpose()?;
    let size = match kind {
        EntryKind::Directory => None,
        _ => Some(size.ok_or_else(|| anyhow!("regular file without size"))?),
    };

    let date = tokens[ts_index];
    let time = tokens[ts_index + 1];
    let modified_at =
        NaiveDateTime::parse_from_str(&format!("{} {}", date.text, time.text), TIMESTAMP_FORMAT)
            .with_context(|| format!("invalid timestamp {} {}", date.text, time.text))?;

    let name = line[time.end()..].trim_start();
    if name.is_empty() {
        bail!("missing name");
    }
    if name.contains('/') {
        bail!("name contains a path separator: {name:?}");
    }

    Ok(EntryRecord {
        permissions: permissions.to_string(),
        owner: owner.text.to_string(),
        group: group.text.to_string(),
        size,
        modified_at,
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|d| d.and_hms_opt(h, mi, 0))
            .unwrap()
    }

    #[test]
    fn parses_regular_file() {
        let e = parse_line("-rw-r--r-- u g 100 2020-01-01 10:00 a.txt").unwrap();
        assert_eq!(e.permissions(), "-rw-r--r--");
        assert_eq!(e.owner(), "u");
        assert_eq!(e.group(), "g");
        assert_eq!(e.size(), Some(100));
        assert_eq!(e.modified_at(), at(2020, 1, 1, 10, 0));
        assert_eq!(e.name(), "a.txt");
        assert_eq!(e.kind(), EntryKind::RegularFile);
    }

    #[test]
    fn parses_directory_without_size() {
        let e = parse_line("drwxr-xr-x u g 2020-01-01 10:00 sub").unwrap();
        assert!(e.is_directory());
        assert_eq!(e.size(), None);
        assert_eq!(e.name(), "sub");
    }

    #[test]
    fn toybox_layout_with_link_count() {
        let f = parse_line("-rw-rw---- 1 u0_a12 media_rw 2048 2019-07-14 09:31 notes.txt").unwrap();
        assert_eq!(f.owner(), "u0_a12");
        assert_eq!(f.group(), "media_rw");
        assert_eq!(f.size(), Some(2048));

        let d = parse_line("drwxrwx--x 4 root sdcard_rw 3488 2019-07-14 09:31 DCIM").unwrap();
        assert!(d.is_directory());
        assert_eq!(d.size(), None);
        assert_eq!(d.owner(), "root");
    }

    #[test]
    fn name_keeps_inner_spaces() {
        let e = parse_line("-rw-r--r-- u g 5 2020-01-01 10:00 my  holiday 2019-08-01 12:00.jpg").unwrap();
        assert_eq!(e.name(), "my  holiday 2019-08-01 12:00.jpg");
    }

    #[test]
    fn strips_carriage_return() {
        let e = parse_line("-rw-r--r-- u g 1 2020-01-01 10:00 a.txt\r").unwrap();
        assert_eq!(e.name(), "a.txt");
    }

    #[test]
    fn same_line_parses_equal() {
        let line = "-rw-rw---- 1 u0_a12 media_rw 2048 2019-07-14 09:31 notes.txt";
        assert_eq!(parse_line(line).unwrap(), parse_line(line).unwrap());
    }

    #[test]
    fn rejects_unreadable_entry() {
        assert!(parse_line("--w------- u g 1 2020-01-01 10:00 secret").is_err());
    }

    #[test]
    fn rejects_symlink_and_devices() {
        assert!(parse_line("lrwxrwxrwx root root 2020-01-01 10:00 sdcard -> /storage/self/primary").is_err());
        assert!(parse_line("crw-rw-rw- root root 1, 3 2020-01-01 10:00 null").is_err());
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "",
            "total 24",
            "-rw-r--r-- u g 100 2020-01-01 a.txt",
            "-rw-r--r-- u g 100 2020-13-01 10:00 a.txt",
            "-rw-r--r-- u g 100 2020-01-01 10:00",
            "-rw-r--r-- u g x1 2020-01-01 10:00 a.txt",
            "-rw-r- u g 100 2020-01-01 10:00 a.txt",
            "opendir failed, Permission denied",
        ] {
            assert!(parse_line(line).is_err(), "accepted {line:?}");
        }
    }

    #[test]
    fn regular_file_requires_size() {
        let err = parse_line("-rw-r--r-- u g 2020-01-01 10:00 a.txt").unwrap_err();
        assert!(err.to_string().contains("without size"));
    }
}
