use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bstr::{BStr, BString, ByteSlice};

use crate::StoreError;

/// A minimal git-style config file.
///
/// Understands `[section]` / `[section "subsection"]` headers, `key = value`
/// entries, and `#`/`;` comments. Keys are looked up by their dotted form
/// (`"user.name"`). Just enough of the format to source an identity.
#[derive(Debug)]
pub struct Config {
    path: PathBuf,
    values: BTreeMap<String, BString>,
}

impl Config {
    /// Load a config file. A missing file is an empty config.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(data) => parse(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Self { path, values })
    }

    /// Look up a value by dotted key, e.g. `"user.name"`.
    pub fn get(&self, key: &str) -> Option<&BStr> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_bstr())
    }

    /// Set a value by dotted key (in memory; call [`save`](Self::save)).
    pub fn set(&mut self, key: &str, value: impl Into<BString>) {
        self.values.insert(key.to_ascii_lowercase(), value.into());
    }

    /// Persist the config back to its file, grouped by section.
    pub fn save(&self) -> Result<(), StoreError> {
        let mut out: Vec<u8> = Vec::new();
        let mut current_section: Option<&str> = None;

        for (key, value) in &self.values {
            let (section, name) = match key.rsplit_once('.') {
                Some(parts) => parts,
                None => continue,
            };
            if current_section != Some(section) {
                if current_section.is_some() {
                    out.push(b'\n');
                }
                out.extend_from_slice(format!("[{section}]\n").as_bytes());
                current_section = Some(section);
            }
            out.extend_from_slice(format!("\t{name} = ").as_bytes());
            out.extend_from_slice(value);
            out.push(b'\n');
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, out)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse(data: &[u8]) -> Result<BTreeMap<String, BString>, StoreError> {
    let mut values = BTreeMap::new();
    let mut section: Option<String> = None;

    for (idx, line) in data.split(|&b| b == b'\n').enumerate() {
        let line = line.trim();
        if line.is_empty() || line[0] == b'#' || line[0] == b';' {
            continue;
        }

        if line[0] == b'[' {
            section = Some(parse_section_header(line, idx + 1)?);
            continue;
        }

        let section = section.as_deref().ok_or(StoreError::ConfigParse {
            line: idx + 1,
            reason: "entry before any section header".into(),
        })?;

        let eq = line
            .find_byte(b'=')
            .ok_or_else(|| StoreError::ConfigParse {
                line: idx + 1,
                reason: "missing '=' in entry".into(),
            })?;
        let key = line[..eq].trim();
        let key = std::str::from_utf8(key).map_err(|_| StoreError::ConfigParse {
            line: idx + 1,
            reason: "non-UTF-8 key".into(),
        })?;
        let value = unquote(line[eq + 1..].trim());

        values.insert(
            format!("{section}.{}", key.to_ascii_lowercase()),
            BString::from(value),
        );
    }

    Ok(values)
}

/// Parse `[section]` or `[section "subsection"]` into a dotted prefix.
fn parse_section_header(line: &[u8], line_no: usize) -> Result<String, StoreError> {
    let close = line
        .find_byte(b']')
        .ok_or_else(|| StoreError::ConfigParse {
            line: line_no,
            reason: "unterminated section header".into(),
        })?;
    let inner = line[1..close].trim();

    let header = if let Some(quote) = inner.find_byte(b'"') {
        let name = inner[..quote].trim();
        let rest = &inner[quote + 1..];
        let end_quote = rest
            .find_byte(b'"')
            .ok_or_else(|| StoreError::ConfigParse {
                line: line_no,
                reason: "unterminated subsection quote".into(),
            })?;
        format!(
            "{}.{}",
            String::from_utf8_lossy(name).to_ascii_lowercase(),
            String::from_utf8_lossy(&rest[..end_quote])
        )
    } else {
        String::from_utf8_lossy(inner).to_ascii_lowercase()
    };

    Ok(header)
}

fn unquote(value: &[u8]) -> &[u8] {
    if value.len() >= 2 && value[0] == b'"' && value[value.len() - 1] == b'"' {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
