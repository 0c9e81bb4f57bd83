//! Line protocol of the interactive producer: `userId,page,element`.

use crate::types::ClickLog;

pub const INPUT_FORMAT: &str = "userId,page,element";
pub const INPUT_EXAMPLE: &str = "user123,homepage,login-button";

/// One parsed line of producer input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Exit,
    Empty,
    InvalidFormat,
    Click(ClickLog),
}

pub fn parse_line(line: &str) -> InputLine {
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") {
        return InputLine::Exit;
    }
    if line.is_empty() {
        return InputLine::Empty;
    }
    let mut parts: Vec<&str> = line.split(',').collect();
    // Trailing empty fields do not count: `a,b,c,` has three.
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    match parts.as_slice() {
        [user_id, page, element] => {
            InputLine::Click(ClickLog::now(user_id.trim(), page.trim(), element.trim()))
        }
        _ => InputLine::InvalidFormat,
    }
}

/// Click logs sent at start-up to check broker connectivity.
pub fn sample_click_logs() -> Vec<ClickLog> {
    [
        ("user001", "homepage", "login-button"),
        ("user002", "product-page", "add-to-cart"),
        ("user001", "cart-page", "checkout-button"),
        ("user003", "homepage", "search-box"),
        ("user002", "checkout-page", "payment-button"),
    ]
    .into_iter()
    .map(|(user_id, page, element)| ClickLog::now(user_id, page, element))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: InputLine) -> (String, String, String) {
        match line {
            InputLine::Click(c) => (c.user_id, c.page, c.element),
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[test]
    fn exit_is_case_insensitive() {
        assert_eq!(parse_line("exit"), InputLine::Exit);
        assert_eq!(parse_line("  EXIT \n"), InputLine::Exit);
        assert_eq!(parse_line("Exit"), InputLine::Exit);
    }

    #[test]
    fn blank_lines_are_empty() {
        assert_eq!(parse_line(""), InputLine::Empty);
        assert_eq!(parse_line("   \t"), InputLine::Empty);
    }

    #[test]
    fn needs_exactly_three_fields() {
        assert_eq!(parse_line("user1,home"), InputLine::InvalidFormat);
        assert_eq!(parse_line("a,b,c,d"), InputLine::InvalidFormat);
        assert_eq!(parse_line("no commas"), InputLine::InvalidFormat);
    }

    #[test]
    fn trailing_commas_are_dropped() {
        assert_eq!(
            fields(parse_line("user1,home,btn,")),
            ("user1".into(), "home".into(), "btn".into())
        );
        assert_eq!(
            fields(parse_line("user1,home,btn,,,")),
            ("user1".into(), "home".into(), "btn".into())
        );
        assert_eq!(parse_line("user1,home,"), InputLine::InvalidFormat);
        assert_eq!(parse_line(",,"), InputLine::InvalidFormat);
    }

    #[test]
    fn fields_are_trimmed() {
        assert_eq!(
            fields(parse_line(" user123 , homepage ,login-button ")),
            ("user123".into(), "homepage".into(), "login-button".into())
        );
    }

    #[test]
    fn blank_field_parses_but_is_invalid() {
        match parse_line("user1, ,button") {
            InputLine::Click(c) => assert!(!c.is_valid()),
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[test]
    fn samples_cover_three_users() {
        let samples = sample_click_logs();
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(ClickLog::is_valid));
        let users: std::collections::BTreeSet<&str> =
            samples.iter().map(|c| c.user_id.as_str()).collect();
        assert_eq!(users.into_iter().collect::<Vec<_>>(), ["user001", "user002", "user003"]);
    }
}
