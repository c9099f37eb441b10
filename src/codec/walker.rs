use crate::codec::DefaultFallback;

/// Tree key carrying the concrete class of a decoded object.
pub const CLASS_NAME_FIELD: &str = "_ClassName";

/// Outcome of decoding a whole document into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
	/// The document was decoded into the slot.
	Written,
	/// The document was an empty array or object; the slot was not touched.
	Nothing,
}

/// Descriptor-driven walker between slots and the abstract value tree.
///
/// Leaves and native object references go through the fallback `F`.
#[derive(Debug, Default)]
pub struct Codec<F = DefaultFallback> {
	pub(crate) fallback: F,
}

impl Codec {
	/// Walker using [`DefaultFallback`].
	pub fn new() -> Self {
		Self::default()
	}
}

impl<F> Codec<F> {
	/// Walker using a custom fallback.
	pub fn with_fallback(fallback: F) -> Self {
		Self { fallback }
	}

	/// Shared access to the fallback.
	pub fn fallback(&self) -> &F {
		&self.fallback
	}

	/// Mutable access to the fallback, e.g. to register objects.
	pub fn fallback_mut(&mut self) -> &mut F {
		&mut self.fallback
	}
}
