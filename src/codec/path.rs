use std::fmt;

/// One step in a property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
	/// Named struct or object field.
	Field(String),
	/// Array or set element by zero-based index.
	Index(usize),
	/// Map entry by key text.
	Key(String),
}

/// Location of a property below the value handed to the codec.
///
/// Rendered as `Root.Field[2]{key}`; the empty path renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropPath {
	/// Ordered steps from the root.
	pub steps: Vec<PathStep>,
}

impl PropPath {
	/// Empty path naming the root value.
	pub fn root() -> Self {
		Self::default()
	}

	/// Child path selecting a field.
	pub fn field(&self, name: &str) -> Self {
		self.with(PathStep::Field(name.to_owned()))
	}

	/// Child path selecting an element.
	pub fn index(&self, index: usize) -> Self {
		self.with(PathStep::Index(index))
	}

	/// Child path selecting a map entry.
	pub fn key(&self, key: &str) -> Self {
		self.with(PathStep::Key(key.to_owned()))
	}

	fn with(&self, step: PathStep) -> Self {
		let mut steps = Vec::with_capacity(self.steps.len() + 1);
		steps.extend_from_slice(&self.steps);
		steps.push(step);
		Self { steps }
	}
}

impl fmt::Display for PropPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.steps.is_empty() {
			return f.write_str("<root>");
		}
		for (pos, step) in self.steps.iter().enumerate() {
			match step {
				PathStep::Field(name) if pos == 0 => f.write_str(name)?,
				PathStep::Field(name) => write!(f, ".{name}")?,
				PathStep::Index(index) => write!(f, "[{index}]")?,
				PathStep::Key(key) => write!(f, "{{{key}}}")?,
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::PropPath;

	#[test]
	fn renders_nested_steps() {
		let path = PropPath::root().field("Items").index(2).field("Tags").key("red");
		assert_eq!(path.to_string(), "Items[2].Tags{red}");
		assert_eq!(PropPath::root().to_string(), "<root>");
	}
}
