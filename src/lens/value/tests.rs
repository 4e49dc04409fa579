use crate::lens::{CoreImage, Encoding, FieldSpec, ImageBuilder, LensError, Scalar, TemplateArg, ValueRef};

fn derived_image() -> CoreImage {
	let mut builder = ImageBuilder::new(8).expect("pointer size");
	let int = builder.int();
	let ch = builder.char_type();
	let ch_ptr = builder.pointer(ch);
	let base = builder.record("Base", vec![FieldSpec::new("inner", int)], Vec::new()).expect("base");
	let derived = builder
		.record("Derived<int, 3>", vec![FieldSpec::base(base), FieldSpec::new("name", ch_ptr), FieldSpec::new("count", int)], vec![TemplateArg::Type(int), TemplateArg::Value(3)])
		.expect("derived");
	let reference = builder.reference(derived);

	let text = builder.alloc(6, 1);
	builder.write_bytes(text, b"hello\0").expect("text");

	let addr = builder.alloc_value(derived).expect("alloc");
	builder.set_field(derived, addr, "inner", 0xffff_fff9).expect("inner");
	builder.set_field(derived, addr, "name", text).expect("name");
	builder.set_field(derived, addr, "count", 2).expect("count");

	let slot = builder.alloc_value(reference).expect("slot");
	builder.write_pointer(slot, addr).expect("ref");

	builder.symbol("value", derived, addr);
	builder.symbol("alias", reference, slot);
	builder.finish().expect("image")
}

#[test]
fn fields_resolve_through_base_subobjects() {
	let image = derived_image();
	let value = image.value("value").expect("symbol");

	let inner = value.field("inner").expect("base member");
	assert_eq!(inner.addr(), value.addr());
	assert_eq!(inner.scalar().expect("scalar"), Some(Scalar::Signed(-7)));
	assert!(value.has_field("count"));
	assert!(!value.has_field("missing"));

	let err = value.field("missing").expect_err("no such member");
	assert!(matches!(err, LensError::MissingField { ref field, .. } if field == "missing"));
}

#[test]
fn references_are_followed_transparently() {
	let image = derived_image();
	let alias = image.value("alias").expect("symbol");
	let direct = image.value("value").expect("symbol");

	assert_eq!(alias.referent().expect("referent"), direct);
	assert_eq!(alias.field("count").expect("count").read_unsigned().expect("read"), 2);
}

#[test]
fn pointer_strings_and_template_args_decode() {
	let image = derived_image();
	let value = image.value("value").expect("symbol");

	let name = value.field("name").expect("name");
	assert!(name.is_pointer());
	assert!(!name.is_null_pointer().expect("read"));
	assert_eq!(name.read_c_string(64).expect("string"), "hello");
	assert_eq!(name.read_c_string(3).expect("bounded"), "hel");

	assert_eq!(value.template_arg_name(0).expect("arg"), "int");
	assert_eq!(value.template_arg_name(1).expect("arg"), "3");
	assert!(matches!(value.template_arg_name(2), Err(LensError::MissingTemplateArg { idx: 2, .. })));
}

#[test]
fn advance_steps_by_element_size() {
	let mut builder = ImageBuilder::new(4).expect("pointer size");
	let short = builder.primitive("short", 2, Encoding::Signed);
	let addr = builder.alloc_array(short, 3).expect("alloc");
	for (idx, value) in [10_u64, 20, 30].into_iter().enumerate() {
		builder.write_uint(addr + 2 * idx as u64, 2, value).expect("write");
	}
	builder.symbol("first", short, addr);
	let image = builder.finish().expect("image");

	let first = image.value("first").expect("symbol");
	let third = first.advance(2).expect("advance");
	assert_eq!(third.addr(), addr + 4);
	assert_eq!(third.read_unsigned().expect("read"), 30);
	assert!(matches!(first.advance(3).expect("address").read_unsigned(), Err(LensError::MemoryRead { .. })));
}

#[test]
fn non_pointer_deref_is_an_error() {
	let image = derived_image();
	let value = image.value("value").expect("symbol");
	assert!(matches!(value.field("count").expect("count").deref(), Err(LensError::ExpectedPointer { .. })));
	assert!(matches!(value.field("count").expect("count").field("x"), Err(LensError::ExpectedRecord { .. })));
}

#[test]
fn member_offsets_past_the_address_space_are_errors() {
	let image = derived_image();
	let ty = image.value("value").expect("symbol").ty();
	let value = ValueRef::new(&image, ty, u64::MAX - 4);

	let err = value.field("name").expect_err("offset wraps");
	assert!(matches!(err, LensError::AddressOverflow { addr } if addr == u64::MAX - 4));
	assert!(matches!(value.fields(), Err(LensError::AddressOverflow { .. })));
	assert_eq!(value.first_base().expect("base at offset 0").map(|base| base.addr()), Some(u64::MAX - 4));
}
