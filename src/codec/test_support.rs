use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use crate::codec::{ClassDesc, EnumDesc, FieldDesc, ScalarKind, Slot, StructDesc, TypeDesc};

pub(crate) fn int32() -> TypeDesc {
	TypeDesc::scalar(ScalarKind::Int32)
}

pub(crate) fn string() -> TypeDesc {
	TypeDesc::scalar(ScalarKind::Str)
}

/// `{Count: int32 = 5, Label: string = "hi"}`
pub(crate) fn counter() -> TypeDesc {
	TypeDesc::structure(Arc::new(StructDesc::new(
		"Counter",
		vec![
			FieldDesc::new("Count", int32()).with_default(Slot::Int(5)),
			FieldDesc::new("Label", string()).with_default(Slot::Str("hi".into())),
		],
	)))
}

/// `{X: float}`
pub(crate) fn point() -> TypeDesc {
	TypeDesc::structure(Arc::new(StructDesc::new("Point", vec![FieldDesc::new("X", TypeDesc::scalar(ScalarKind::Float))])))
}

/// Struct whose internal names differ from the authored ones, with one of every container.
pub(crate) fn inventory() -> TypeDesc {
	let quality = Arc::new(EnumDesc::new("Quality", [("Common", 0), ("Rare", 1), ("Epic", 2)]));
	TypeDesc::structure(Arc::new(StructDesc::new(
		"Inventory",
		vec![
			FieldDesc::new("owner_name_0", string()).authored("Owner"),
			FieldDesc::new("slots_1", TypeDesc::array(point())).authored("Slots"),
			FieldDesc::new("tags_2", TypeDesc::set(TypeDesc::scalar(ScalarKind::Name))).authored("Tags"),
			FieldDesc::new("stock_3", TypeDesc::map(int32(), TypeDesc::scalar(ScalarKind::Double))).authored("Stock"),
			FieldDesc::new("grade_4", TypeDesc::scalar(ScalarKind::Enum(quality))).authored("Grade"),
			FieldDesc::new("sealed_5", TypeDesc::scalar(ScalarKind::Bool)).authored("Sealed"),
		],
	)))
}

/// Non-native `Node` class with a self reference and a `Leaf` subclass.
pub(crate) fn node_classes() -> (Arc<ClassDesc>, Arc<ClassDesc>) {
	let node = ClassDesc::declare("Node", None);
	let node_ref = TypeDesc::object(node.clone());
	node.define(vec![
		FieldDesc::new("Id", int32()).with_default(Slot::Int(-1)),
		FieldDesc::new("Next", node_ref),
	])
	.expect("node defines");
	let leaf = ClassDesc::new("Leaf", Some(node.clone()), vec![FieldDesc::new("Weight", TypeDesc::scalar(ScalarKind::Double))]).expect("leaf defines");
	(node, leaf)
}

/// Shared buffer collecting formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().map_err(|_| io::Error::other("log buffer poisoned"))?.extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<'a> MakeWriter<'a> for LogBuffer {
	type Writer = Self;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}

/// Run `f` with a subscriber recording its log output.
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
	let buffer = LogBuffer::default();
	let subscriber = tracing_subscriber::fmt().with_writer(buffer.clone()).finish();
	let out = tracing::subscriber::with_default(subscriber, f);
	let logs = String::from_utf8_lossy(&buffer.0.lock().expect("log buffer")).into_owned();
	(out, logs)
}
