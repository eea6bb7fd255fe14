use std::cell::RefCell;
use std::rc::Rc;

use collab_client::{SharedMap, SubscriptionId, Value};
use log::{debug, warn};
use rand::Rng;

use crate::session::DICE_VALUE_KEY;
use crate::ui::DiceView;

/// First code point of the die-face block; face `n` is this plus `n`.
const DIE_FACE_BASE: u32 = 0x267F;

/// How a dice value is drawn: a die-face glyph in a per-value color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceFace {
    /// The value, 1 through 6.
    pub value: u8,
    /// One of `⚀` … `⚅`.
    pub glyph: char,
    /// Hue in degrees, `value * 60`.
    pub hue: u16,
}

impl DiceFace {
    /// Face for `value`, or `None` outside `1..=6`.
    pub fn for_value(value: i64) -> Option<Self> {
        let value = u8::try_from(value).ok().filter(|v| (1..=6).contains(v))?;
        let glyph = char::from_u32(DIE_FACE_BASE + u32::from(value))?;
        Some(Self {
            value,
            glyph,
            hue: u16::from(value) * 60,
        })
    }

    /// All six faces in order.
    pub fn all() -> impl Iterator<Item = DiceFace> {
        (1..=6).filter_map(Self::for_value)
    }

    /// CSS color string for the glyph.
    pub fn css_color(&self) -> String {
        format!("hsl({}, 70%, 30%)", self.hue)
    }
}

/// Binds the dice map to a [`DiceView`].
pub struct DiceBinding {
    map: SharedMap,
    subscription: SubscriptionId,
}

impl DiceBinding {
    /// Draw the current value now and after every change of the dice key,
    /// including this participant's own rolls.
    pub fn attach(map: SharedMap, view: Rc<RefCell<dyn DiceView>>) -> Self {
        render(&map, &view);

        let source = map.clone();
        let subscription = map.on_value_changed(move |change| {
            if change.key == DICE_VALUE_KEY {
                render(&source, &view);
            }
        });
        debug!("dice binding attached to {} as {subscription}", map.name());

        Self { map, subscription }
    }

    /// Write a uniformly random value in `1..=6` and return it.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        let value: u8 = rng.gen_range(1..=6);
        self.map.set(DICE_VALUE_KEY, i64::from(value));
        value
    }

    /// Stop updating the view.
    pub fn detach(self) {
        self.map.off(self.subscription);
    }
}

fn render(map: &SharedMap, view: &Rc<RefCell<dyn DiceView>>) {
    match map.get(DICE_VALUE_KEY) {
        Some(Value::Int(v)) => match DiceFace::for_value(v) {
            Some(face) => view.borrow_mut().show(face),
            None => warn!("ignoring dice value {v} outside 1..=6"),
        },
        Some(other) => warn!("ignoring non-integer dice value {other}"),
        None => debug!("no dice value yet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn faces_match_the_die_face_block() {
        let glyphs: String = DiceFace::all().map(|f| f.glyph).collect();
        assert_eq!(glyphs, "⚀⚁⚂⚃⚄⚅");
        let hues: Vec<u16> = DiceFace::all().map(|f| f.hue).collect();
        assert_eq!(hues, vec![60, 120, 180, 240, 300, 360]);
    }

    #[test]
    fn css_color_uses_fixed_saturation_and_lightness() {
        let face = DiceFace::for_value(2).unwrap();
        assert_eq!(face.css_color(), "hsl(120, 70%, 30%)");
    }

    #[test]
    fn out_of_range_values_have_no_face() {
        for v in [0, 7, -1, 256, i64::MAX, i64::MIN] {
            assert_eq!(DiceFace::for_value(v), None, "value {v}");
        }
    }

    proptest! {
        #[test]
        fn face_is_a_pure_function_of_value(v in 1i64..=6) {
            let a = DiceFace::for_value(v).unwrap();
            let b = DiceFace::for_value(v).unwrap();
            prop_assert_eq!(a, b);
            prop_assert_eq!(i64::from(a.value), v);
            prop_assert_eq!(u32::from(a.glyph), 0x267F + v as u32);
            prop_assert_eq!(i64::from(a.hue), v * 60);
        }

        #[test]
        fn values_outside_range_never_render(v in any::<i64>().prop_filter("outside", |v| !(1..=6).contains(v))) {
            prop_assert!(DiceFace::for_value(v).is_none());
        }
    }
}
