use std::fmt;

use thiserror::Error;

/// Section → key → value document consumed by the processing backend.
///
/// Sections and keys keep insertion order. Rendering follows the layout the
/// backend's parser reads: `[Section]` headers, `key = value` lines and a
/// blank line after every section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct IniParseError {
    pub line: usize,
    pub reason: String,
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty section; existing sections are left untouched.
    pub fn add_section(&mut self, name: &str) {
        if !self.has_section(name) {
            self.sections.push(Section {
                name: name.to_string(),
                entries: Vec::new(),
            });
        }
    }

    /// Sets a value, creating the section if needed. Overwriting keeps the
    /// key's original position.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.add_section(section);
        let value = value.into();
        let Some(target) = self.sections.iter_mut().find(|s| s.name == section) else {
            return;
        };
        match target.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => target.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Key/value pairs of one section, in insertion order.
    pub fn entries(&self, section: &str) -> Vec<(&str, &str)> {
        self.section(section)
            .map(|s| {
                s.entries
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in &section.entries {
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(&value.replace('\n', "\n\t"));
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Reads a rendered document back.
    ///
    /// Blank lines and `#`/`;` comments are skipped; indented lines continue
    /// the previous value.
    pub fn parse(text: &str) -> Result<Self, IniParseError> {
        let mut config = BackendConfig::new();
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if raw.starts_with([' ', '\t']) {
                let (Some(section), Some(key)) = (&current, &last_key) else {
                    return Err(IniParseError {
                        line: line_number,
                        reason: "continuation line without a preceding key".to_string(),
                    });
                };
                let mut value = config.get(section, key).unwrap_or_default().to_string();
                value.push('\n');
                value.push_str(trimmed);
                config.set(section, key, value);
                continue;
            }

            if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                config.add_section(name);
                current = Some(name.to_string());
                last_key = None;
                continue;
            }

            let Some(section) = &current else {
                return Err(IniParseError {
                    line: line_number,
                    reason: "entry outside of any section".to_string(),
                });
            };
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(IniParseError {
                    line: line_number,
                    reason: format!("expected `key = value`, found `{trimmed}`"),
                });
            };
            let key = key.trim();
            config.set(section, key, value.trim());
            last_key = Some(key.to_string());
        }

        Ok(config)
    }
}

impl fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let mut config = BackendConfig::new();
        config.set("Default", "task", "neuro");
        config.set("Default", "caller", "");
        config.set("System", "gpu_id", "-1");

        assert_eq!(
            config.render(),
            "[Default]\ntask = neuro\ncaller = \n\n[System]\ngpu_id = -1\n\n"
        );
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut config = BackendConfig::new();
        config.set("System", "a", "1");
        config.set("System", "b", "2");
        config.set("System", "a", "3");
        assert_eq!(config.entries("System"), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_parse_reads_rendered_document() {
        let mut config = BackendConfig::new();
        config.set("Default", "caller", "");
        config.set("Neuro", "cortical_features", "MNI, Schaefer7");
        config.set("Notes", "text", "first\nsecond");

        let parsed = BackendConfig::parse(&config.render()).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.get("Notes", "text"), Some("first\nsecond"));
        assert_eq!(parsed.get("Default", "caller"), Some(""));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(BackendConfig::parse("key = value").unwrap_err().line, 1);
        assert_eq!(
            BackendConfig::parse("[A]\n# note\nno delimiter").unwrap_err().line,
            3
        );
    }
}
