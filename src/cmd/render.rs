use serde::Serialize;

use contlens::lens::{Child, Children, Result, Scalar, Scope, ValueRef, index_label};

/// Output truncation limits for printed values.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum number of children listed for one value.
	pub max_children: usize,
	/// Maximum nesting depth that is expanded.
	pub max_depth: u32,
	/// Maximum bytes shown for string summaries.
	pub max_string_len: usize,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			max_children: 16,
			max_depth: 6,
			max_string_len: 200,
		}
	}
}

/// Rendered value tree, printed as text or serialised as JSON.
#[derive(Debug, Serialize)]
pub struct Node {
	/// Symbol name, member name, or index label.
	pub label: String,
	/// Static type display name.
	#[serde(rename = "type")]
	pub type_name: String,
	/// Hex address of the value.
	pub addr: String,
	/// Decoder family, absent for default formatting.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub family: Option<&'static str>,
	/// Display hint label.
	pub hint: &'static str,
	/// One-line summary.
	pub summary: String,
	/// Listed children.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<Node>,
	/// Children exist beyond the listed ones.
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub truncated: bool,
	/// Decoding failed and the value fell back to default formatting.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// The child listing ended early on this error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub children_error: Option<String>,
}

impl Node {
	fn new(label: String, value: ValueRef<'_>) -> Self {
		Self {
			label,
			type_name: value.type_name(),
			addr: format!("0x{:016x}", value.addr()),
			family: None,
			hint: "none",
			summary: String::new(),
			children: Vec::new(),
			truncated: false,
			error: None,
			children_error: None,
		}
	}
}

/// Decode `value` through `scope`, falling back to default formatting.
pub fn render(scope: &Scope, value: ValueRef<'_>, label: String, depth: u32, options: PrintOptions) -> Node {
	let mut node = Node::new(label, value);
	match scope.resolve(value) {
		Ok(Some(decoder)) => match decoder.summary() {
			Ok(summary) => {
				node.family = Some(decoder.family());
				node.hint = decoder.display_hint().as_str();
				node.summary = summary;
				list(scope, decoder.children(), &mut node, depth, options);
				return node;
			}
			Err(err) => node.error = Some(err.to_string()),
		},
		Ok(None) => {}
		Err(err) => node.error = Some(err.to_string()),
	}
	fallback(scope, value, &mut node, depth, options);
	node
}

fn list(scope: &Scope, mut children: Children<'_>, node: &mut Node, depth: u32, options: PrintOptions) {
	if depth >= options.max_depth {
		node.truncated = children.next().is_some();
		return;
	}
	for item in children {
		if node.children.len() == options.max_children {
			node.truncated = true;
			break;
		}
		match item {
			Ok(child) => node.children.push(render(scope, child.value, child.label, depth + 1, options)),
			Err(err) => {
				node.children_error = Some(err.to_string());
				break;
			}
		}
	}
}

fn fallback<'a>(scope: &Scope, value: ValueRef<'a>, node: &mut Node, depth: u32, options: PrintOptions) {
	let value = match value.referent() {
		Ok(value) => value,
		Err(err) => {
			node.summary = "<unreadable>".to_owned();
			node.error.get_or_insert(err.to_string());
			return;
		}
	};

	match value.scalar() {
		Ok(Some(scalar)) => {
			node.summary = format_scalar(scalar);
			return;
		}
		Ok(None) => {}
		Err(err) => {
			node.summary = "<unreadable>".to_owned();
			node.error.get_or_insert(err.to_string());
			return;
		}
	}

	if let Some(len) = value.array_len() {
		node.hint = "array";
		node.summary.clone_from(&node.type_name);
		let items = (0..len).map(move |idx| -> Result<Child<'a>> {
			Ok(Child {
				label: index_label(idx),
				value: value.element(idx)?,
			})
		});
		list(scope, Box::new(items), node, depth, options);
		return;
	}

	match value.fields() {
		Ok(fields) => {
			node.summary = format!("{} {{...}}", node.type_name);
			let items = fields.into_iter().map(|(name, value)| -> Result<Child<'a>> {
				Ok(Child {
					label: name.to_owned(),
					value,
				})
			});
			list(scope, Box::new(items), node, depth, options);
		}
		Err(_) => node.summary.clone_from(&node.type_name),
	}
}

fn format_scalar(scalar: Scalar) -> String {
	match scalar {
		Scalar::Signed(v) => v.to_string(),
		Scalar::Unsigned(v) => v.to_string(),
		Scalar::Float(v) => v.to_string(),
		Scalar::Bool(v) => v.to_string(),
		Scalar::Char(v) if v.is_ascii_graphic() || v == b' ' => format!("{v} '{}'", char::from(v)),
		Scalar::Char(v) => v.to_string(),
		Scalar::Pointer(v) => format!("0x{v:016x}"),
	}
}

/// Print one rendered tree as indented text.
pub fn print_node(node: &Node, indent: usize) {
	let pad = " ".repeat(indent);
	let summary = if node.hint == "string" { format!("{:?}", node.summary) } else { node.summary.clone() };
	let note = node.error.as_ref().map(|err| format!(" <error: {err}>")).unwrap_or_default();

	if node.children.is_empty() && !node.truncated && node.children_error.is_none() {
		println!("{pad}{} = {summary}{note}", node.label);
		return;
	}

	println!("{pad}{} = {summary}{note} {{", node.label);
	for child in &node.children {
		print_node(child, indent + 2);
	}
	if let Some(err) = &node.children_error {
		println!("{pad}  <error: {err}>");
	}
	if node.truncated {
		println!("{pad}  ...");
	}
	println!("{pad}}}");
}

#[cfg(test)]
mod tests {
	use contlens::lens::{ChainCap, DecodeOptions, ImageBuilder};

	use super::{PrintOptions, render};
	use crate::cmd::util::build_scope;

	#[test]
	fn containers_nest_and_respect_limits() {
		let image = contlens::lens::demo_image(8).expect("demo");
		let scope = build_scope(false, DecodeOptions::default());
		let options = PrintOptions {
			max_children: 2,
			..PrintOptions::default()
		};

		let node = render(&scope, image.value("numbers").expect("symbol"), "numbers".to_owned(), 0, options);
		assert_eq!(node.family, Some("Array"));
		assert_eq!(node.children.len(), 2);
		assert!(node.truncated);
		assert_eq!(node.children[0].label, "[0]");

		let node = render(&scope, image.value("point").expect("symbol"), "point".to_owned(), 0, options);
		assert_eq!(node.family, None);
		assert_eq!(node.children.iter().map(|child| child.label.as_str()).collect::<Vec<_>>(), vec!["x", "y"]);

		let shallow = PrintOptions {
			max_depth: 0,
			..PrintOptions::default()
		};
		let node = render(&scope, image.value("numbers").expect("symbol"), "numbers".to_owned(), 0, shallow);
		assert!(node.children.is_empty());
		assert!(node.truncated);
	}

	#[test]
	fn broken_chains_keep_earlier_children() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		let ty = builder.list_type(int).expect("list");
		let placed = builder.place_list(ty, 3).expect("place");
		builder.fill(&placed, &[4, 5, 6]).expect("fill");
		let second = placed.nodes[1];
		builder.symbol("list", ty, placed.addr);
		let mut file = builder.finish().expect("image").to_file();

		// Point the second node's `next` at unmapped memory.
		for region in &mut file.regions {
			if region.addr == second {
				region.bytes[8..16].copy_from_slice(&0xdead_0000_u64.to_le_bytes());
			}
		}
		let image = contlens::lens::CoreImage::from_file(file).expect("image");
		let scope = build_scope(false, DecodeOptions {
			chain_cap: ChainCap::StoredCount,
			max_string_len: 64,
		});

		let node = render(&scope, image.value("list").expect("symbol"), "list".to_owned(), 0, PrintOptions::default());
		assert_eq!(node.summary, "List<int>[3]");
		assert_eq!(node.children.iter().map(|child| child.summary.as_str()).collect::<Vec<_>>(), vec!["4", "5"]);
		assert!(node.children_error.as_deref().is_some_and(|err| err.contains("0x00000000dead0000")));
	}
}
