use crate::iq_pipeline::interpolation::region::InterpolationOutcome;

/// Maximum number of children a level search may select for one parent.
pub const MAX_CHILDREN: usize = 3;

/// A tuning-tree payload that may carry leaf parameter data.
pub trait TreePayload<'a, P>: Copy {
    fn leaf_data(&self) -> Option<&'a P>;
}

/// Children chosen by one level search, with the blend ratios between them.
///
/// With three children, `ratios[1]` blends children 1 and 2 first and `ratios[0]`
/// blends child 0 with that partial result.
#[derive(Debug, Clone, Copy)]
pub struct ChildSelection<N> {
    children: [Option<N>; MAX_CHILDREN],
    len: usize,
    ratios: [f32; MAX_CHILDREN - 1],
}

impl<N: Copy> ChildSelection<N> {
    pub fn none() -> Self {
        Self {
            children: [None; MAX_CHILDREN],
            len: 0,
            ratios: [0.0; MAX_CHILDREN - 1],
        }
    }

    pub fn single(child: N) -> Self {
        let mut selection = Self::none();
        selection.children[0] = Some(child);
        selection.len = 1;
        selection
    }

    pub fn pair(first: N, second: N, ratio: f32) -> Self {
        let mut selection = Self::single(first);
        selection.children[1] = Some(second);
        selection.len = 2;
        selection.ratios[0] = ratio;
        selection
    }

    /// Instantiates the children an [`InterpolationOutcome`] points at.
    ///
    /// Yields no children when `child_at` cannot resolve an index.
    pub fn from_outcome(outcome: InterpolationOutcome, child_at: impl Fn(usize) -> Option<N>) -> Self {
        let Some(first) = child_at(outcome.start_index) else {
            return Self::none();
        };
        if outcome.is_single() {
            return Self::single(first);
        }
        match child_at(outcome.end_index) {
            Some(second) => Self::pair(first, second, outcome.ratio),
            None => Self::none(),
        }
    }

    /// Appends a child, storing `ratio` in the last used ratio position.
    ///
    /// Returns `false` when the selection is empty or already full.
    pub fn push(&mut self, child: N, ratio: f32) -> bool {
        if self.len == 0 || self.len == MAX_CHILDREN {
            return false;
        }
        self.ratios[self.len - 1] = ratio;
        self.children[self.len] = Some(child);
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn children(&self) -> impl Iterator<Item = N> + '_ {
        self.children[..self.len].iter().flatten().copied()
    }

    pub fn ratios(&self) -> [f32; MAX_CHILDREN - 1] {
        self.ratios
    }
}

/// Where a node's parameter block lives once interpolation has reached it.
#[derive(Debug)]
pub(crate) enum NodeData<'a, P> {
    Unresolved,
    Tuning(&'a P),
    Scratch(usize),
}

impl<P> Clone for NodeData<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for NodeData<'_, P> {}

/// One arena slot of the interpolation tree.
#[derive(Debug, Clone)]
pub struct TuningNode<'a, N, P> {
    pub valid: bool,
    /// Tree depth, root is level 1.
    pub level: usize,
    pub payload: Option<N>,
    /// Debug back-reference, never used for traversal.
    pub parent: Option<usize>,
    pub children: [usize; MAX_CHILDREN],
    pub num_children: usize,
    pub ratios: [f32; MAX_CHILDREN - 1],
    pub(crate) data: NodeData<'a, P>,
}

impl<N, P> TuningNode<'_, N, P> {
    pub(crate) fn empty() -> Self {
        Self {
            valid: false,
            level: 0,
            payload: None,
            parent: None,
            children: [0; MAX_CHILDREN],
            num_children: 0,
            ratios: [0.0; MAX_CHILDREN - 1],
            data: NodeData::Unresolved,
        }
    }

    /// True when this node reuses a child's block instead of owning a blended copy.
    pub fn is_alias(&self, own_index: usize) -> bool {
        match self.data {
            NodeData::Tuning(_) => true,
            NodeData::Scratch(index) => index != own_index,
            NodeData::Unresolved => false,
        }
    }
}
