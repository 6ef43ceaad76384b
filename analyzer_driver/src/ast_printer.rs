//! Indented parse-tree dump for `--dump-ast`, in the same recursive,
//! one-`println!`-per-node shape as the teacher's `DebuggingPrinter`
//! dumps for its own AST and assembly trees.

use colored::Colorize;
use parse_tree::{NodeKind, ParseNode};

pub fn print(root: &ParseNode) {
    print_node(root, 0);
}

fn print_node(node: &ParseNode, indent_level: usize) {
    let indent = " ".repeat(indent_level);
    let label = format!("{:?}", node.kind);

    if node.kind == NodeKind::Empty {
        println!("{}{}", indent, label.dimmed());
    } else if let Some(text) = &node.text {
        println!("{}{}({})", indent, label.cyan(), text.yellow());
    } else {
        println!("{}{}", indent, label.cyan());
    }

    for child in &node.children {
        print_node(child, indent_level + 2);
    }
}
