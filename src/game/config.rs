//! Key/params line format used by the effect bundle and pose scripts.

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Text(String),
    Number(f32),
}

impl ConfigValue {
    fn parse(token: String) -> Self {
        match token.parse::<f32>() {
            Ok(number) => ConfigValue::Number(number),
            Err(_) => ConfigValue::Text(token),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLine {
    pub key: String,
    params: Vec<ConfigValue>,
}

impl ConfigLine {
    /// Text parameter at `index`, or an empty string when absent or numeric.
    pub fn text(&self, index: usize) -> String {
        match self.params.get(index) {
            Some(ConfigValue::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// Numeric parameter at `index`, or 0.0 when absent or non-numeric.
    pub fn number(&self, index: usize) -> f32 {
        match self.params.get(index) {
            Some(ConfigValue::Number(n)) => *n,
            _ => 0.0,
        }
    }

    pub fn maybe_number(&self, index: usize) -> Option<f32> {
        match self.params.get(index) {
            Some(ConfigValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

/// Split a line into whitespace-separated tokens, honoring double quotes.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let Some(&first) = chars.peek() else {
            break;
        };

        let mut token = String::new();
        if first == '"' {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                token.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }

        tokens.push(token);
    }

    tokens
}

pub fn parse_line(line: &str) -> Option<ConfigLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
        return None;
    }

    let mut tokens = tokenize(line).into_iter();
    let key = tokens.next()?;
    let params = tokens.map(ConfigValue::parse).collect();

    Some(ConfigLine { key, params })
}

pub struct ConfigLines {
    lines: Vec<ConfigLine>,
}

impl ConfigLines {
    pub fn parse(s: &str) -> Self {
        Self {
            lines: s.lines().filter_map(parse_line).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigLine> {
        self.lines.iter()
    }
}
