//! Line lexer for ca65 source.
//!
//! ca65 is line oriented, so the lexer works one line at a time.  A raw
//! line is split into up to four items, each carrying the byte offset where
//! it begins in the original line: label, command, arguments, comment.
//! Nothing here consults the symbol tables; classification of the command
//! word is left to the scanner.

/// A slice of the line together with the byte offset where it begins.
#[derive(Clone,PartialEq,Debug)]
pub struct LineItem {
    pub text: String,
    pub offset: usize
}

impl LineItem {
    fn new(text: &str,offset: usize) -> Self {
        Self { text: text.to_string(), offset }
    }
}

/// The items of one lexed line.  Any of them may be absent.
#[derive(Clone,Default,Debug)]
pub struct LexedLine {
    pub label: Option<LineItem>,
    pub command: Option<LineItem>,
    pub args: Option<LineItem>,
    pub comment: Option<LineItem>
}

impl LexedLine {
    /// command text in lower case, empty string if there is no command
    pub fn command_lower(&self) -> String {
        match &self.command {
            Some(item) => item.text.to_lowercase(),
            None => String::new()
        }
    }
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '@'
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '@'
}

pub fn is_identifier(txt: &str) -> bool {
    let mut chars = txt.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_char),
        _ => false
    }
}

/// Find the byte offset of the first `;` that is outside of a string or
/// character literal, if any.
fn comment_start(line: &str) -> Option<usize> {
    let mut in_dquote = false;
    let mut in_squote = false;
    for (i,c) in line.char_indices() {
        match c {
            '"' if !in_squote => in_dquote = !in_dquote,
            '\'' if !in_dquote => in_squote = !in_squote,
            ';' if !in_dquote && !in_squote => return Some(i),
            _ => {}
        }
    }
    None
}

/// Find the byte offset just past a label-ending colon within `word`, i.e.
/// a colon not immediately followed by `:`, `<`, `>`, `+`, or `-` (those
/// form anonymous-label constructs).  `next` is the byte following the
/// word, if any.
fn label_colon(word: &str,next: Option<char>) -> Option<usize> {
    let bytes = word.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == b':' {
            let follower = match i+1 < bytes.len() {
                true => Some(bytes[i+1] as char),
                false => next
            };
            match follower {
                Some(':') | Some('<') | Some('>') | Some('+') | Some('-') => continue,
                _ => return Some(i)
            }
        }
    }
    None
}

/// Split one raw line into label, command, argument, and comment items.
pub fn lex_line(line: &str) -> LexedLine {
    let mut ans = LexedLine::default();
    let mut end = line.len();
    if let Some(start) = comment_start(line) {
        ans.comment = Some(LineItem::new(&line[start..],start));
        end = start;
    }
    let code = &line[0..end];
    let mut cursor = 0;

    // optional label: the first word, if it ends at a label colon and the
    // part before the colon is a single identifier-like token (or empty,
    // which defines an anonymous label)
    let word_start = match code.char_indices().find(|(_,c)| !c.is_whitespace()) {
        Some((i,_)) => i,
        None => return ans
    };
    let word_end = code[word_start..].char_indices()
        .find(|(_,c)| c.is_whitespace())
        .map(|(i,_)| word_start + i)
        .unwrap_or(code.len());
    let word = &code[word_start..word_end];
    let next = code[word_end..].chars().next();
    if let Some(colon) = label_colon(word,next) {
        let name = &word[0..colon];
        if name.is_empty() || is_identifier(name) {
            ans.label = Some(LineItem::new(name,word_start));
            cursor = word_start + colon + 1;
        }
    }
    if ans.label.is_none() {
        cursor = word_start;
    }

    // command: first whitespace-delimited word after the optional label
    let cmd_start = match code[cursor..].char_indices().find(|(_,c)| !c.is_whitespace()) {
        Some((i,_)) => cursor + i,
        None => return ans
    };
    let cmd_end = code[cmd_start..].char_indices()
        .find(|(_,c)| c.is_whitespace())
        .map(|(i,_)| cmd_start + i)
        .unwrap_or(code.len());
    ans.command = Some(LineItem::new(&code[cmd_start..cmd_end],cmd_start));

    // arguments: the rest, right trimmed
    let arg_start = match code[cmd_end..].char_indices().find(|(_,c)| !c.is_whitespace()) {
        Some((i,_)) => cmd_end + i,
        None => return ans
    };
    let arg_text = code[arg_start..].trim_end();
    if !arg_text.is_empty() {
        ans.args = Some(LineItem::new(arg_text,arg_start));
    }
    ans
}
