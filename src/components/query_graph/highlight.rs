//! Legend highlight: which nodes and edges stay at full opacity.

use crate::graph::NodeKind;

/// Opacity of anything outside the highlight.
pub const DIMMED_ALPHA: f64 = 0.15;

/// New highlight target after the legend entry for `clicked` is pressed.
///
/// An entry highlights the opposite kind; pressing it again clears.
pub fn toggle_highlight(current: Option<NodeKind>, clicked: NodeKind) -> Option<NodeKind> {
	let target = clicked.opposite();
	(current != Some(target)).then_some(target)
}

pub fn node_emphasized(highlight: Option<NodeKind>, kind: NodeKind) -> bool {
	highlight.is_none_or(|target| target == kind)
}

/// An edge stays emphasised when either end matches the target.
pub fn edge_emphasized(highlight: Option<NodeKind>, source: NodeKind, target: NodeKind) -> bool {
	node_emphasized(highlight, source) || node_emphasized(highlight, target)
}

pub fn alpha_for(emphasized: bool) -> f64 {
	if emphasized { 1.0 } else { DIMMED_ALPHA }
}

#[cfg(test)]
mod tests {
	use super::*;
	use NodeKind::{Term, Variable};

	#[test]
	fn legend_highlights_opposite_kind() {
		assert_eq!(toggle_highlight(None, Term), Some(Variable));
		assert_eq!(toggle_highlight(None, Variable), Some(Term));
	}

	#[test]
	fn second_click_clears() {
		let once = toggle_highlight(None, Term);
		assert_eq!(toggle_highlight(once, Term), None);
	}

	#[test]
	fn switching_entries_retargets() {
		assert_eq!(toggle_highlight(Some(Variable), Variable), Some(Term));
	}

	#[test]
	fn dim_predicates() {
		assert!(node_emphasized(None, Term));
		assert!(node_emphasized(Some(Variable), Variable));
		assert!(!node_emphasized(Some(Variable), Term));

		assert!(edge_emphasized(Some(Variable), Variable, Term));
		assert!(!edge_emphasized(Some(Variable), Term, Term));
		assert_eq!(alpha_for(false), DIMMED_ALPHA);
	}
}
