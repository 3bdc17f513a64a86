//! Realistic string data backed by the `fake` crate.
//!
//! Synthesis talks to a [`FakeProvider`] keyed by [`FakeCategory`]; the
//! default implementation is [`FakeRsProvider`]. Categories can be inferred
//! from a field's output key.

mod adapter;
mod category;
mod locales;

pub use adapter::FakeRsProvider;
pub use category::FakeCategory;
pub use locales::LocaleKey;

use rand::RngCore;

/// Injectable source of realistic values.
pub trait FakeProvider: Send + Sync {
    /// Produce a value for `category`, or `None` when the category is not
    /// supported, in which case synthesis falls back to random text.
    fn fake(&self, category: FakeCategory, locale: LocaleKey, rng: &mut dyn RngCore)
    -> Option<String>;
}
