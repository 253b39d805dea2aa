//! Style state driven by markup tags.

use crate::asset::ColorGradient;
use crate::color::{self, Color32};

use super::config::HorizontalAlign;

bitflags::bitflags! {
    /// Style bits carried by every character.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FontStyles: u16 {
        const BOLD = 1;
        const ITALIC = 2;
        const UNDERLINE = 4;
        const LOWERCASE = 8;
        const UPPERCASE = 16;
        const SMALLCAPS = 32;
        const STRIKETHROUGH = 64;
        const SUPERSCRIPT = 128;
        const SUBSCRIPT = 256;
        const HIGHLIGHT = 512;
    }
}

/// Array backed stack with a default item at the bottom.
///
/// Popping past the last pushed item is a no-op: the default item stays in
/// place, so an unmatched closing tag falls back to the configured value.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStack<T: Clone> {
    items: Vec<T>,
    capacity: usize,
}

impl<T: Clone> TextStack<T> {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(default: T) -> Self {
        Self::with_capacity(default, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(default: T, capacity: usize) -> Self {
        let mut items = Vec::with_capacity(capacity.min(8));
        items.push(default);
        Self {
            items,
            capacity: capacity.max(1),
        }
    }

    /// Resets the stack so it only holds `default`.
    pub fn set_default(&mut self, default: T) {
        self.items.clear();
        self.items.push(default);
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() >= self.capacity {
            log::debug!("style stack is full ({} items), ignoring push", self.capacity);
            return;
        }
        self.items.push(item);
    }

    /// Removes the top item and returns the new current item.
    pub fn pop(&mut self) -> T {
        if self.items.len() > 1 {
            self.items.pop();
        }
        self.current()
    }

    pub fn current(&self) -> T {
        self.items[self.items.len() - 1].clone()
    }

    pub fn default_item(&self) -> T {
        self.items[0].clone()
    }

    /// Number of pushed items above the default.
    pub fn depth(&self) -> usize {
        self.items.len() - 1
    }
}

/// Nesting counters for the toggling styles, so `<b><b></b>` stays bold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontStyleStack {
    counts: [u8; 10],
}

impl FontStyleStack {
    fn slot(style: FontStyles) -> Option<usize> {
        let bits = style.bits();
        if bits.count_ones() != 1 {
            return None;
        }
        Some(bits.trailing_zeros() as usize)
    }

    /// Opens one level of `style` and returns the number of open levels.
    pub fn add(&mut self, style: FontStyles) -> u8 {
        match Self::slot(style) {
            Some(slot) => {
                self.counts[slot] = self.counts[slot].saturating_add(1);
                self.counts[slot]
            }
            None => 0,
        }
    }

    /// Closes one level of `style` and returns the number of open levels left.
    pub fn remove(&mut self, style: FontStyles) -> u8 {
        match Self::slot(style) {
            Some(slot) => {
                self.counts[slot] = self.counts[slot].saturating_sub(1);
                self.counts[slot]
            }
            None => 0,
        }
    }

    pub fn active(&self) -> FontStyles {
        let mut styles = FontStyles::empty();
        for (slot, &count) in self.counts.iter().enumerate() {
            if count > 0 {
                styles |= FontStyles::from_bits_truncate(1 << slot);
            }
        }
        styles
    }

    pub fn clear(&mut self) {
        self.counts = [0; 10];
    }
}

/// Background color and padding of a `<mark>` run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightState {
    pub color: Color32,
    pub padding: [f32; 4],
}

impl Default for HighlightState {
    fn default() -> Self {
        Self {
            color: color::HIGHLIGHT,
            padding: [0.0; 4],
        }
    }
}

/// Every stack the markup tags push to and pop from.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleStacks {
    pub style: FontStyleStack,
    pub size: TextStack<f32>,
    pub indent: TextStack<f32>,
    pub font_weight: TextStack<u16>,
    pub italic_angle: TextStack<f32>,
    pub baseline_offset: TextStack<f32>,
    pub color: TextStack<Color32>,
    pub underline_color: TextStack<Color32>,
    pub strikethrough_color: TextStack<Color32>,
    pub highlight: TextStack<HighlightState>,
    pub color_gradient: TextStack<Option<ColorGradient>>,
    pub line_justification: TextStack<HorizontalAlign>,
    /// Index into the material reference manager.
    pub material_reference: TextStack<usize>,
    /// Index of the open `<link>`, if any.
    pub action: TextStack<Option<usize>>,
}

/// Initial values of [`StyleStacks`] for one layout pass.
#[derive(Clone, Debug)]
pub struct StyleDefaults {
    pub font_size: f32,
    pub font_weight: u16,
    pub italic_angle: f32,
    pub color: Color32,
    pub color_gradient: Option<ColorGradient>,
    pub alignment: HorizontalAlign,
    pub material_reference: usize,
}

impl StyleStacks {
    pub fn new(defaults: &StyleDefaults) -> Self {
        Self {
            style: FontStyleStack::default(),
            size: TextStack::new(defaults.font_size),
            indent: TextStack::new(0.0),
            font_weight: TextStack::new(defaults.font_weight),
            italic_angle: TextStack::new(defaults.italic_angle),
            baseline_offset: TextStack::new(0.0),
            color: TextStack::new(defaults.color),
            underline_color: TextStack::new(defaults.color),
            strikethrough_color: TextStack::new(defaults.color),
            highlight: TextStack::new(HighlightState::default()),
            color_gradient: TextStack::new(defaults.color_gradient),
            line_justification: TextStack::new(defaults.alignment),
            material_reference: TextStack::new(defaults.material_reference),
            action: TextStack::new(None),
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underflow_falls_back_to_default() {
        let mut stack = TextStack::new(12.0);
        stack.push(20.0);
        assert_eq!(stack.current(), 20.0);
        assert_eq!(stack.pop(), 12.0);
        assert_eq!(stack.pop(), 12.0);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn capacity_bounds_pushes() {
        let mut stack = TextStack::with_capacity(0u16, 2);
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.current(), 1);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn set_default_discards_pushed_items() {
        let mut stack = TextStack::new(1);
        stack.push(2);
        stack.set_default(5);
        assert_eq!(stack.current(), 5);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn nested_styles_need_matching_closes() {
        let mut styles = FontStyleStack::default();
        styles.add(FontStyles::BOLD);
        styles.add(FontStyles::BOLD);
        styles.add(FontStyles::ITALIC);
        assert_eq!(styles.active(), FontStyles::BOLD | FontStyles::ITALIC);

        styles.remove(FontStyles::BOLD);
        assert!(styles.active().contains(FontStyles::BOLD));
        styles.remove(FontStyles::BOLD);
        assert_eq!(styles.active(), FontStyles::ITALIC);

        assert_eq!(styles.remove(FontStyles::UNDERLINE), 0);
    }

    #[test]
    fn style_bits_match_documented_values() {
        assert_eq!(FontStyles::BOLD.bits(), 1);
        assert_eq!(FontStyles::ITALIC.bits(), 2);
        assert_eq!(FontStyles::UNDERLINE.bits(), 4);
        assert_eq!(FontStyles::STRIKETHROUGH.bits(), 64);
        assert_eq!(FontStyles::HIGHLIGHT.bits(), 512);
    }
}
