use crate::codec::{ScalarKind, ScriptMap, ScriptSet, Slot, TypeDesc};

#[test]
fn set_rehash_frees_duplicates_and_leaves_holes() {
	let elem = TypeDesc::scalar(ScalarKind::Int32);
	let mut set = ScriptSet::default();
	for value in [3, 5, 3] {
		let idx = set.add_default_needs_rehash(&elem);
		*set.element_mut(idx).expect("slot exists") = Slot::Int(value);
	}
	assert!(set.needs_rehash());
	assert!(set.contains(&Slot::Int(3)), "lookup works before rehash");

	set.rehash();

	assert_eq!(set.len(), 2);
	assert_eq!(set.slot_count(), 3, "duplicate leaves an unoccupied slot");
	assert!(set.contains(&Slot::Int(5)));
	assert_eq!(set.iter().cloned().collect::<Vec<_>>(), vec![Slot::Int(3), Slot::Int(5)]);
}

#[test]
fn set_equality_ignores_order() {
	let left = ScriptSet::from_elements([Slot::Str("a".into()), Slot::Str("b".into())]);
	let right = ScriptSet::from_elements([Slot::Str("b".into()), Slot::Str("a".into())]);
	assert_eq!(left, right);
}

#[test]
fn map_rehash_keeps_later_duplicate() {
	let mut map = ScriptMap::from_pairs([(Slot::Int(1), Slot::Str("old".into())), (Slot::Int(2), Slot::Str("two".into()))]);
	map.insert(Slot::Int(1), Slot::Str("new".into()));

	assert_eq!(map.len(), 2);
	assert_eq!(map.find(&Slot::Int(1)), Some(&Slot::Str("new".into())));
	assert_eq!(map.find(&Slot::Int(3)), None);
}

#[test]
fn float_zero_signs_hash_alike() {
	let set = ScriptSet::from_elements([Slot::Double(0.0), Slot::Double(-0.0)]);
	assert_eq!(set.len(), 1);
}

#[test]
fn array_resize_fills_defaults() {
	let elem = TypeDesc::scalar(ScalarKind::Str);
	let mut slot = Slot::default_for(&TypeDesc::array(elem.clone()));
	let Slot::Array(array) = &mut slot else {
		panic!("expected array storage");
	};
	array.resize(2, &elem);
	assert_eq!(array.get(1), Some(&Slot::Str(String::new())));
	array.resize(1, &elem);
	assert_eq!(array.len(), 1);
}
