//! Directory-tree rendering of changed file lists.

use std::collections::BTreeMap;

use termtree::Tree;

#[derive(Default)]
struct Node {
  children: BTreeMap<String, Node>
}

/// Render file paths as a directory tree, one top-level entry per root.
/// Directories carry a trailing slash.
pub fn build_file_tree(files: &[String]) -> String {
  let mut root = Node::default();

  let mut sorted: Vec<&String> = files.iter().collect();
  sorted.sort();

  for file in sorted {
    let mut node = &mut root;
    for part in file.split('/').filter(|part| !part.is_empty()) {
      node = node.children.entry(part.to_string()).or_default();
    }
  }

  let rendered: String = root
    .children
    .iter()
    .map(|(name, node)| to_tree(name, node).to_string())
    .collect();

  rendered.trim_end().to_string()
}

fn to_tree(name: &str, node: &Node) -> Tree<String> {
  let label = if node.children.is_empty() {
    name.to_string()
  } else {
    format!("{name}/")
  };

  let mut tree = Tree::new(label);
  for (child_name, child) in &node.children {
    tree.push(to_tree(child_name, child));
  }
  tree
}
