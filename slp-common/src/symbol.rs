//! Gesture symbols and alphabets
//!
//! A symbol is the discrete unit a gesture interface turns into an
//! application action: a letter A-Z, one of the typing controls (SPACE,
//! ENTER, DELETE) or an opaque command token such as `SWIPE_LEFT`.
//!
//! Symbols travel over the wire as their canonical label (`"A"`, `"SPACE"`,
//! `"BACKSPACE"`, `"SWIPE_LEFT"`).

use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recognized gesture symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GestureSymbol {
    /// Upper-case letter A-Z
    ///
    /// Build from user input with [`GestureSymbol::letter`]; [`dispatch`]
    /// ignores any other character.
    ///
    /// [`dispatch`]: crate::buffer::dispatch
    Letter(char),
    /// Append a space
    Space,
    /// Commit the typed text
    Enter,
    /// Remove the last typed character (label `BACKSPACE`, alias `DELETE`)
    Delete,
    /// Opaque control token forwarded to the action sink
    Command(String),
}

impl GestureSymbol {
    /// Build a letter symbol, normalizing case. Only ASCII A-Z is accepted.
    pub fn letter(c: char) -> Result<Self> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Ok(GestureSymbol::Letter(upper))
        } else {
            Err(Error::InvalidInput(format!("Not a gesture letter: {c:?}")))
        }
    }

    /// Build a command symbol from a control token
    pub fn command(token: &str) -> Result<Self> {
        match token.parse::<GestureSymbol>()? {
            cmd @ GestureSymbol::Command(_) => Ok(cmd),
            other => Err(Error::InvalidInput(format!(
                "{} is a typing symbol, not a command",
                other
            ))),
        }
    }

    /// Canonical label used for display and serialization
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// The letter carried by this symbol, if any
    pub fn as_letter(&self) -> Option<char> {
        match self {
            GestureSymbol::Letter(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for GestureSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureSymbol::Letter(c) => write!(f, "{}", c),
            GestureSymbol::Space => f.write_str("SPACE"),
            GestureSymbol::Enter => f.write_str("ENTER"),
            GestureSymbol::Delete => f.write_str("BACKSPACE"),
            GestureSymbol::Command(token) => f.write_str(token),
        }
    }
}

impl FromStr for GestureSymbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        if label.is_empty() {
            return Err(Error::InvalidInput("Empty gesture label".to_string()));
        }

        let mut chars = label.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return GestureSymbol::letter(c);
        }

        let upper = label.to_ascii_uppercase();
        match upper.as_str() {
            "SPACE" => Ok(GestureSymbol::Space),
            "ENTER" => Ok(GestureSymbol::Enter),
            "DELETE" | "BACKSPACE" => Ok(GestureSymbol::Delete),
            _ if upper
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_') =>
            {
                Ok(GestureSymbol::Command(upper))
            }
            _ => Err(Error::InvalidInput(format!(
                "Invalid gesture label: {:?}",
                label
            ))),
        }
    }
}

impl TryFrom<String> for GestureSymbol {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<GestureSymbol> for String {
    fn from(symbol: GestureSymbol) -> Self {
        symbol.to_string()
    }
}

/// Fixed, non-empty set of symbols a gesture source can report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<GestureSymbol>,
}

impl Alphabet {
    /// Letters A-Z plus SPACE, ENTER and BACKSPACE
    pub fn standard() -> Self {
        let mut symbols: Vec<GestureSymbol> = ('A'..='Z').map(GestureSymbol::Letter).collect();
        symbols.push(GestureSymbol::Space);
        symbols.push(GestureSymbol::Enter);
        symbols.push(GestureSymbol::Delete);
        Self { symbols }
    }

    /// Standard alphabet plus the presentation swipe commands
    pub fn extended() -> Self {
        let mut alphabet = Self::standard();
        alphabet
            .symbols
            .push(GestureSymbol::Command("SWIPE_LEFT".to_string()));
        alphabet
            .symbols
            .push(GestureSymbol::Command("SWIPE_RIGHT".to_string()));
        alphabet
    }

    /// Build an alphabet from configured labels
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let symbols = labels
            .iter()
            .map(|label| label.as_ref().parse::<GestureSymbol>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(symbols)
    }

    /// Build an alphabet from symbols; duplicates are dropped, order kept
    pub fn new(symbols: Vec<GestureSymbol>) -> Result<Self> {
        let mut unique: Vec<GestureSymbol> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }

        if unique.is_empty() {
            return Err(Error::Config(
                "Gesture alphabet must not be empty".to_string(),
            ));
        }

        Ok(Self { symbols: unique })
    }

    pub fn symbols(&self) -> &[GestureSymbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &GestureSymbol) -> bool {
        self.symbols.contains(symbol)
    }

    /// Pick a symbol uniformly at random
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> GestureSymbol {
        // Non-empty by construction
        self.symbols
            .choose(rng)
            .cloned()
            .unwrap_or(GestureSymbol::Space)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parse(label: &str) -> GestureSymbol {
        label.parse().unwrap()
    }

    #[test]
    fn test_parse_letters_case_insensitive() {
        assert_eq!(parse("a"), GestureSymbol::Letter('A'));
        assert_eq!(parse("Z"), GestureSymbol::Letter('Z'));
    }

    #[test]
    fn test_parse_controls_and_aliases() {
        assert_eq!(parse("space"), GestureSymbol::Space);
        assert_eq!(parse("ENTER"), GestureSymbol::Enter);
        assert_eq!(parse("DELETE"), GestureSymbol::Delete);
        assert_eq!(parse("Backspace"), GestureSymbol::Delete);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse("swipe_left"),
            GestureSymbol::Command("SWIPE_LEFT".to_string())
        );
        assert!(GestureSymbol::command("VOICE").is_ok());
        assert!(GestureSymbol::command("SPACE").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<GestureSymbol>().is_err());
        assert!("   ".parse::<GestureSymbol>().is_err());
        assert!("7".parse::<GestureSymbol>().is_err());
        assert!("OPEN URL".parse::<GestureSymbol>().is_err());
        assert!("é".parse::<GestureSymbol>().is_err());
    }

    #[test]
    fn test_label_is_canonical() {
        assert_eq!(GestureSymbol::Delete.label(), "BACKSPACE");
        assert_eq!(GestureSymbol::Letter('Q').label(), "Q");
        let parsed: GestureSymbol = GestureSymbol::Space.label().parse().unwrap();
        assert_eq!(parsed, GestureSymbol::Space);
    }

    #[test]
    fn test_serde_uses_plain_strings() {
        let json = serde_json::to_string(&GestureSymbol::Letter('H')).unwrap();
        assert_eq!(json, "\"H\"");

        let symbol: GestureSymbol = serde_json::from_str("\"swipe_right\"").unwrap();
        assert_eq!(symbol, GestureSymbol::Command("SWIPE_RIGHT".to_string()));

        assert!(serde_json::from_str::<GestureSymbol>("\"no way\"").is_err());
    }

    #[test]
    fn test_standard_alphabet() {
        let alphabet = Alphabet::standard();
        assert_eq!(alphabet.len(), 29);
        assert!(alphabet.contains(&GestureSymbol::Letter('M')));
        assert!(alphabet.contains(&GestureSymbol::Delete));
        let swipe_left = GestureSymbol::Command("SWIPE_LEFT".to_string());
        assert!(!alphabet.contains(&swipe_left));
    }

    #[test]
    fn test_extended_alphabet_adds_swipes() {
        let alphabet = Alphabet::extended();
        assert_eq!(alphabet.len(), 31);
        let swipe_right = GestureSymbol::Command("SWIPE_RIGHT".to_string());
        assert!(alphabet.contains(&swipe_right));
    }

    #[test]
    fn test_from_labels() {
        let alphabet = Alphabet::from_labels(&["A", "b", "SPACE", "A"]).unwrap();
        assert_eq!(alphabet.len(), 3);

        assert!(Alphabet::from_labels::<&str>(&[]).is_err());
        assert!(Alphabet::from_labels(&["A", "bad label"]).is_err());
    }

    #[test]
    fn test_choose_stays_in_alphabet() {
        let alphabet = Alphabet::from_labels(&["A", "B", "ENTER"]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(alphabet.contains(&alphabet.choose(&mut rng)));
        }
    }
}
