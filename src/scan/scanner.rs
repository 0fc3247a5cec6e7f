#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Word or quoted identifier at the head of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token {
    /// Unquoted word, case-folded to lower case.
    Word(String),
    /// Double-quoted identifier with `""` unescaped, case preserved.
    Quoted(String),
}

impl Token {
    pub(super) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(word) if word == keyword)
    }

    pub(super) fn into_name(self) -> String {
        match self {
            Token::Word(word) | Token::Quoted(word) => word,
        }
    }
}

pub(super) fn scan_word(bytes: &[u8], start: usize) -> Option<(usize, Token)> {
    let first = *bytes.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len()
        && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_' || bytes[idx] == b'$')
    {
        idx += 1;
    }
    let word = std::str::from_utf8(&bytes[start..idx]).ok()?;
    Some((idx, Token::Word(word.to_ascii_lowercase())))
}

pub(super) fn scan_quoted(bytes: &[u8], start: usize) -> Option<(usize, Token)> {
    if bytes.get(start) != Some(&b'"') {
        return None;
    }
    let mut name = Vec::new();
    let mut idx = start + 1;
    while idx < bytes.len() {
        if bytes[idx] == b'"' {
            if bytes.get(idx + 1) == Some(&b'"') {
                name.push(b'"');
                idx += 2;
                continue;
            }
            let name = String::from_utf8(name).ok()?;
            return Some((idx + 1, Token::Quoted(name)));
        }
        name.push(bytes[idx]);
        idx += 1;
    }
    None
}
