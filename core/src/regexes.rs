//! Central lexical rules shared by the PRISM and GMC file readers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref NONNEGATIVE_INTEGER: Regex = Regex::new(r"^(?:[1-9][0-9]*|0)$").unwrap();
    pub static ref NONNEGATIVE_FLOAT: Regex = Regex::new(r"^(?:[0-9]*\.)?[0-9]+$").unwrap();

    /// `<states> <transitions>` header line of a PRISM `.tra`/`.trew` file.
    pub static ref PRISM_FILE_HEADER: Regex =
        Regex::new(r"^\s*([0-9]+)\s+([0-9]+)\s*$").unwrap();

    /// `<from> <to> <value>` body line of a PRISM `.tra`/`.trew` file.
    pub static ref PRISM_VALUE_LINE: Regex =
        Regex::new(r"^\s*([0-9]+)\s+([0-9]+)\s+((?:[0-9]*\.)?[0-9]+)\s*$").unwrap();

    /// `<state_id>: <lbl1> <lbl2> ...` line of a PRISM label file.
    pub static ref PRISM_LABEL_LINE: Regex =
        Regex::new(r"^\s*([0-9]+)\s*:\s*((?:[0-9]+\s*)*)$").unwrap();

    /// `$col1,$col2,...` semantics header line of a GMC file.
    pub static ref GMC_COLUMN_NAME: Regex = Regex::new(r"^\$[A-Za-z_][A-Za-z0-9_]*$").unwrap();

    /// Full-line comment, ignored by the GMC reader.
    pub static ref GMC_COMMENT_LINE: Regex = Regex::new(r"^\s*#.*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonnegative_integer_rejects_leading_zero() {
        assert!(NONNEGATIVE_INTEGER.is_match("0"));
        assert!(NONNEGATIVE_INTEGER.is_match("42"));
        assert!(!NONNEGATIVE_INTEGER.is_match("007"));
        assert!(!NONNEGATIVE_INTEGER.is_match("-1"));
    }

    #[test]
    fn prism_header_matches_two_numbers() {
        let caps = PRISM_FILE_HEADER.captures("12 34\n").unwrap();
        assert_eq!(&caps[1], "12");
        assert_eq!(&caps[2], "34");
    }

    #[test]
    fn prism_value_line_matches_triple() {
        assert!(PRISM_VALUE_LINE.is_match("0 1 0.5"));
        assert!(PRISM_VALUE_LINE.is_match("0 1 1"));
        assert!(!PRISM_VALUE_LINE.is_match("0 1"));
    }

    #[test]
    fn gmc_column_name_requires_dollar_prefix() {
        assert!(GMC_COLUMN_NAME.is_match("$from"));
        assert!(!GMC_COLUMN_NAME.is_match("from"));
    }
}
