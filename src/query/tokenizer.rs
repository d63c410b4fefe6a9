//! Query tokenization.
//!
//! A query is a flat string like `moses & aaron ~ 1` or
//! `startswith jos - (egypt, river)`. The tokenizer turns it into a
//! sequence of command and parameter tokens; it never judges whether the
//! sequence makes sense. Validity is the engine's concern, so degenerate
//! input like `&~5-/` tokenizes deterministically and fails later with a
//! positioned syntax error.

/// The closed set of query commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Union the next operand into the running result (`/`, `|`, or
    /// implicit at the start of a query).
    Add,
    /// Intersect with the next operand (`&`, `+`, `,`).
    Retain,
    /// Subtract the next operand (`-`).
    Remove,
    /// Re-blur the previous operand by the radius that follows (`~`).
    Blur,
    /// Expand the next word to all indexed words sharing its prefix
    /// (`sw` / `startswith`).
    StartsWith,
    /// Expand the next word to its inflected forms via stemming
    /// (`gr` / `grammar`).
    Grammar,
    /// `(`
    GroupOpen,
    /// `)`
    GroupClose,
}

/// One token, carrying its byte position for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Command { kind: CommandKind, pos: usize },
    Param { text: String, pos: usize },
}

fn operator(ch: char) -> Option<CommandKind> {
    match ch {
        '/' | '|' => Some(CommandKind::Add),
        '&' | '+' | ',' => Some(CommandKind::Retain),
        '-' => Some(CommandKind::Remove),
        '~' => Some(CommandKind::Blur),
        '(' => Some(CommandKind::GroupOpen),
        ')' => Some(CommandKind::GroupClose),
        _ => None,
    }
}

fn keyword(word: &str) -> Option<CommandKind> {
    if word.eq_ignore_ascii_case("sw") || word.eq_ignore_ascii_case("startswith") {
        Some(CommandKind::StartsWith)
    } else if word.eq_ignore_ascii_case("gr") || word.eq_ignore_ascii_case("grammar") {
        Some(CommandKind::Grammar)
    } else {
        None
    }
}

/// Split a query string into tokens. Whitespace separates but is never a
/// token; operators self-delimit, so `a&b` and `a & b` tokenize alike.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if let Some(kind) = operator(ch) {
            chars.next();
            tokens.push(Token::Command { kind, pos });
            continue;
        }

        let mut text = String::new();
        while let Some(&(_, ch)) = chars.peek() {
            if ch.is_whitespace() || operator(ch).is_some() {
                break;
            }
            text.push(ch);
            chars.next();
        }

        match keyword(&text) {
            Some(kind) => tokens.push(Token::Command { kind, pos }),
            None => tokens.push(Token::Param { text, pos }),
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
    }

    fn command(kind: CommandKind, pos: usize) -> Token {
        Token::Command { kind, pos }
    }

    fn param(text: &str, pos: usize) -> Token {
        Token::Param {
            text: text.to_string(),
            pos,
        }
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(
            kinds("moses aaron"),
            vec![param("moses", 0), param("aaron", 6)]
        );
    }

    #[test]
    fn test_operators_self_delimit() {
        assert_eq!(
            kinds("moses&aaron"),
            vec![
                param("moses", 0),
                command(CommandKind::Retain, 5),
                param("aaron", 6)
            ]
        );
        assert_eq!(
            kinds("moses & aaron"),
            vec![
                param("moses", 0),
                command(CommandKind::Retain, 6),
                param("aaron", 8)
            ]
        );
    }

    #[test]
    fn test_all_operator_aliases() {
        for (text, kind) in [
            ("/", CommandKind::Add),
            ("|", CommandKind::Add),
            ("&", CommandKind::Retain),
            ("+", CommandKind::Retain),
            (",", CommandKind::Retain),
            ("-", CommandKind::Remove),
            ("~", CommandKind::Blur),
            ("(", CommandKind::GroupOpen),
            (")", CommandKind::GroupClose),
        ] {
            assert_eq!(kinds(text), vec![command(kind, 0)], "operator {text}");
        }
    }

    #[test]
    fn test_keywords_beat_literals() {
        assert_eq!(
            kinds("sw joshu"),
            vec![command(CommandKind::StartsWith, 0), param("joshu", 3)]
        );
        assert_eq!(
            kinds("STARTSWITH joshu")[0],
            command(CommandKind::StartsWith, 0)
        );
        assert_eq!(kinds("gr love")[0], command(CommandKind::Grammar, 0));
        assert_eq!(kinds("grammar love")[0], command(CommandKind::Grammar, 0));
        // Not a keyword, just a word.
        assert_eq!(kinds("sword"), vec![param("sword", 0)]);
    }

    #[test]
    fn test_blur_radius_is_a_param() {
        assert_eq!(
            kinds("moses~2"),
            vec![
                param("moses", 0),
                command(CommandKind::Blur, 5),
                param("2", 6)
            ]
        );
    }

    #[test]
    fn test_degenerate_input_tokenizes() {
        assert_eq!(
            kinds("&~5-/"),
            vec![
                command(CommandKind::Retain, 0),
                command(CommandKind::Blur, 1),
                param("5", 2),
                command(CommandKind::Remove, 3),
                command(CommandKind::Add, 4),
            ]
        );
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }
}
