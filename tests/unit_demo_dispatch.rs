#![allow(missing_docs)]

use contlens::lens::{ChainCap, Compression, CoreImage, DecodeOptions, Decoder, DisplayHint, Registry, Scalar, Scope, ValueRef, default_registry, demo_image, dev_registry, register_default_printer};

fn decoder<'a>(registry: &Registry, value: ValueRef<'a>) -> Box<dyn Decoder<'a> + 'a> {
	registry.resolve(value).expect("resolve").expect("decoder")
}

fn scalars(decoder: Box<dyn Decoder<'_> + '_>) -> Vec<(String, Scalar)> {
	decoder
		.children()
		.map(|child| {
			let child = child.expect("child");
			(child.label, child.value.scalar().expect("scalar").expect("primitive"))
		})
		.collect()
}

fn ints(decoder: Box<dyn Decoder<'_> + '_>) -> Vec<i64> {
	scalars(decoder)
		.into_iter()
		.map(|(_, scalar)| match scalar {
			Scalar::Signed(value) => value,
			other => panic!("expected signed integer, got {other:?}"),
		})
		.collect()
}

#[test]
fn every_demo_symbol_dispatches_to_its_family() {
	let image = demo_image(8).expect("demo");
	let registry = default_registry();
	let expected = [
		("numbers", Some("Array")),
		("greeting", Some("StringBase")),
		("legacy_greeting", Some("StringBase")),
		("names", Some("Array")),
		("record", Some("Tuple")),
		("queue_list", Some("List")),
		("ordered", Some("Tree")),
		("tags", Some("Set")),
		("ages", Some("Map")),
		("lookup", Some("HashMap")),
		("seen", Some("HashSet")),
		("point_pair", Some("Pair")),
		("maybe", Some("Optional")),
		("ring", Some("CircularQueue")),
		("counter", None),
		("point", None),
		("raw_buffer", None),
		("seen_table", None),
	];
	for (name, family) in expected {
		let found = registry.resolve(image.value(name).expect("symbol")).expect("resolve");
		assert_eq!(found.map(|decoder| decoder.family()), family, "{name}");
	}

	let dev = dev_registry();
	assert_eq!(decoder(&dev, image.value("raw_buffer").expect("symbol")).family(), "ArrayBase");
	assert_eq!(decoder(&dev, image.value("seen_table").expect("symbol")).family(), "HashTable");
}

#[test]
fn demo_values_decode_in_logical_order() {
	let image = demo_image(8).expect("demo");
	let registry = default_registry();

	let numbers = decoder(&registry, image.value("numbers").expect("symbol"));
	assert_eq!(numbers.summary().expect("summary"), "Array<int>[5]");
	assert_eq!(numbers.display_hint(), DisplayHint::Array);
	assert_eq!(ints(numbers), vec![3, 1, 4, 1, 5]);

	let greeting = decoder(&registry, image.value("greeting").expect("symbol"));
	assert_eq!(greeting.summary().expect("summary"), "hello, world");
	assert_eq!(greeting.display_hint(), DisplayHint::String);
	let legacy = decoder(&registry, image.value("legacy_greeting").expect("symbol"));
	assert_eq!(legacy.summary().expect("summary"), "legacy layout");
	let empty = decoder(&registry, image.value("empty_string").expect("symbol"));
	assert_eq!(empty.summary().expect("summary"), "");

	assert_eq!(ints(decoder(&registry, image.value("queue_list").expect("symbol"))), vec![10, 20, 30]);
	assert_eq!(ints(decoder(&registry, image.value("ordered").expect("symbol"))), vec![1, 3, 5, 7, 9]);
	assert_eq!(ints(decoder(&registry, image.value("tags").expect("symbol"))), vec![2, 4, 6]);
	assert_eq!(ints(decoder(&registry, image.value("ring").expect("symbol"))), vec![100, 200, 300]);

	let lookup = decoder(&registry, image.value("lookup").expect("symbol"));
	assert_eq!(lookup.summary().expect("summary"), "HashMap<int, int>[3]");
	assert_eq!(lookup.display_hint(), DisplayHint::Map);
	let flat = scalars(lookup);
	assert_eq!(flat.iter().map(|(label, _)| label.as_str()).collect::<Vec<_>>(), ["[0]", "[1]", "[2]", "[3]", "[4]", "[5]"]);
	let mut pairs: Vec<(Scalar, Scalar)> = flat.chunks(2).map(|pair| (pair[0].1, pair[1].1)).collect();
	pairs.sort_by_key(|(key, _)| match key {
		Scalar::Signed(key) => *key,
		_ => i64::MAX,
	});
	assert_eq!(
		pairs,
		vec![
			(Scalar::Signed(3), Scalar::Signed(2)),
			(Scalar::Signed(17), Scalar::Signed(1)),
			(Scalar::Signed(33), Scalar::Signed(3)),
		]
	);

	let mut seen = ints(decoder(&registry, image.value("seen").expect("symbol")));
	seen.sort_unstable();
	assert_eq!(seen, vec![5, 8, 21]);

	let maybe = decoder(&registry, image.value("maybe").expect("symbol"));
	assert_eq!(maybe.summary().expect("summary"), "Optional<int>");
	assert_eq!(ints(maybe), vec![99]);
	let nothing = decoder(&registry, image.value("nothing").expect("symbol"));
	assert_eq!(nothing.summary().expect("summary"), "Optional<int> (empty)");
	assert_eq!(nothing.children().count(), 0);
}

#[test]
fn map_values_decode_through_nested_printers() {
	let image = demo_image(8).expect("demo");
	let mut scope = Scope::new();
	register_default_printer(&mut scope);

	let ages = scope.resolve(image.value("ages").expect("symbol")).expect("resolve").expect("decoder");
	assert!(ages.summary().expect("summary").starts_with("Map<int, "));
	let children: Vec<_> = ages.children().map(|child| child.expect("child")).collect();
	assert_eq!(children.len(), 6);

	let texts: Vec<String> = children
		.iter()
		.skip(1)
		.step_by(2)
		.map(|child| scope.resolve(child.value).expect("resolve").expect("string decoder").summary().expect("summary"))
		.collect();
	assert_eq!(texts, ["one", "two", "three"]);
}

#[test]
fn decoding_twice_gives_identical_results() {
	let image = demo_image(4).expect("demo");
	let registry = default_registry();
	for symbol in image.symbols() {
		let value = image.value(&symbol.name).expect("symbol");
		let Some(first) = registry.resolve(value).expect("resolve") else {
			continue;
		};
		let second = decoder(&registry, value);
		assert_eq!(first.summary().expect("summary"), second.summary().expect("summary"), "{}", symbol.name);
		let first: Vec<_> = first.children().map(|child| child.expect("child")).collect();
		let second: Vec<_> = second.children().map(|child| child.expect("child")).collect();
		assert_eq!(first, second, "{}", symbol.name);
	}
}

#[test]
fn saved_images_decode_the_same_after_reopening() {
	let dir = tempfile::tempdir().expect("tempdir");
	let image = demo_image(8).expect("demo");
	let registry = default_registry().with_options(DecodeOptions {
		chain_cap: ChainCap::Unbounded,
		max_string_len: 64,
	});

	for (file, compression) in [("demo.json", Compression::None), ("demo.json.zst", Compression::Zstd)] {
		let path = dir.path().join(file);
		image.save(&path, compression).expect("save");
		let reopened = CoreImage::open(&path).expect("open");
		assert_eq!(reopened.symbols().len(), image.symbols().len());

		for name in ["ordered", "lookup", "ring", "record"] {
			let before = decoder(&registry, image.value(name).expect("symbol"));
			let after = decoder(&registry, reopened.value(name).expect("symbol"));
			assert_eq!(before.summary().expect("summary"), after.summary().expect("summary"));
			assert_eq!(scalars(before), scalars(after), "{name}");
		}
	}
}
