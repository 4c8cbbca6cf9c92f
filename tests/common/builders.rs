//! Test data builders for creating cards

use cardflow::config::RECORD_WIDTH;
use cardflow::Card;

/// Builder for creating test cards
pub struct CardBuilder {
    text: String,
    width: Option<usize>,
    pad: char,
}

impl CardBuilder {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            width: None,
            pad: '.',
        }
    }

    /// Pad (or cut) the card to exactly `width` characters.
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Pad to a full 80-column card.
    pub fn full(self) -> Self {
        self.width(RECORD_WIDTH)
    }

    pub fn pad(mut self, pad: char) -> Self {
        self.pad = pad;
        self
    }

    pub fn build(self) -> Card {
        let mut card: Card = self.text.chars().collect();
        if let Some(width) = self.width {
            card.resize(width, self.pad);
        }
        card
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_builder() {
        let card = CardBuilder::new("abc").full().pad('-').build();
        assert_eq!(card.len(), 80);
        assert_eq!(card[..3], ['a', 'b', 'c']);
        assert_eq!(card[3], '-');
    }
}
