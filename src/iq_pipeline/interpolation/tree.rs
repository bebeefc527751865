use tracing::debug;

use crate::iq_pipeline::common::error::{IqError, Result};
use crate::iq_pipeline::interpolation::blend::LeafBlender;
use crate::iq_pipeline::interpolation::node::{
    ChildSelection, MAX_CHILDREN, NodeData, TreePayload, TuningNode,
};

/// Selects the children of one tree node from the live trigger vector.
pub trait LevelSearch<N, T> {
    fn search(&self, parent: &N, triggers: &T) -> ChildSelection<N>;
}

impl<N, T, F> LevelSearch<N, T> for F
where
    F: Fn(&N, &T) -> ChildSelection<N>,
{
    fn search(&self, parent: &N, triggers: &T) -> ChildSelection<N> {
        self(parent, triggers)
    }
}

/// One tree level: its search and the maximum number of children per node.
pub struct TreeLevel<'s, N, T> {
    search: Box<dyn LevelSearch<N, T> + 's>,
    fan_out: usize,
}

impl<'s, N, T> TreeLevel<'s, N, T> {
    pub fn new(search: impl LevelSearch<N, T> + 's, fan_out: usize) -> Self {
        Self {
            search: Box::new(search),
            fan_out,
        }
    }

    pub fn fan_out(&self) -> usize {
        self.fan_out
    }
}

/// Arena-backed interpolation tree.
///
/// Nodes live in one flat array laid out level by level; the children of the node at
/// position `p` within its level occupy `fan_out` consecutive slots of the next level
/// starting at `p * fan_out`. The arena and the per-node scratch blocks are sized once
/// in [`InterpolationTree::new`] and reused by every build.
pub struct InterpolationTree<'a, N, P, T> {
    levels: Vec<TreeLevel<'a, N, T>>,
    level_offsets: Vec<usize>,
    nodes: Vec<TuningNode<'a, N, P>>,
    scratch: Vec<P>,
    partial: P,
    built: bool,
}

impl<'a, N, P, T> InterpolationTree<'a, N, P, T>
where
    N: TreePayload<'a, P>,
    P: Default + Clone,
{
    pub fn new(levels: Vec<TreeLevel<'a, N, T>>) -> Result<Self> {
        if levels.is_empty() {
            return Err(IqError::InvalidArgument(
                "interpolation tree needs at least one level".to_string(),
            ));
        }

        let mut level_offsets = Vec::with_capacity(levels.len() + 2);
        level_offsets.push(0);
        let mut width = 1;
        for (depth, level) in levels.iter().enumerate() {
            if level.fan_out == 0 || level.fan_out > MAX_CHILDREN {
                return Err(IqError::InvalidArgument(format!(
                    "level {} fan-out {} outside 1..={}",
                    depth + 1,
                    level.fan_out,
                    MAX_CHILDREN
                )));
            }
            let start = level_offsets[depth];
            level_offsets.push(start + width);
            width *= level.fan_out;
        }
        let leaf_start = level_offsets[levels.len()];
        level_offsets.push(leaf_start + width);

        let total = leaf_start + width;
        debug!(
            levels = levels.len(),
            nodes = total,
            non_leaf = leaf_start,
            "Interpolation tree arena sized"
        );

        Ok(Self {
            levels,
            level_offsets,
            nodes: (0..total).map(|_| TuningNode::empty()).collect(),
            scratch: vec![P::default(); leaf_start],
            partial: P::default(),
            built: false,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn non_leaf_count(&self) -> usize {
        self.level_offsets[self.levels.len()]
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn nodes(&self) -> &[TuningNode<'a, N, P>] {
        &self.nodes
    }

    /// Installs `root` and runs every level search top-down.
    pub fn build(&mut self, root: N, triggers: &T) -> Result<()> {
        self.built = false;
        for node in &mut self.nodes {
            *node = TuningNode::empty();
        }

        let root_node = &mut self.nodes[0];
        root_node.valid = true;
        root_node.level = 1;
        root_node.payload = Some(root);

        for (depth, level) in self.levels.iter().enumerate() {
            let start = self.level_offsets[depth];
            let end = self.level_offsets[depth + 1];

            for index in start..end {
                if !self.nodes[index].valid {
                    continue;
                }
                let Some(parent) = self.nodes[index].payload else {
                    continue;
                };

                let selection = level.search.search(&parent, triggers);
                if selection.is_empty() {
                    return Err(IqError::TreeBuildFailure {
                        level: depth + 1,
                        node: index,
                    });
                }
                if selection.len() > level.fan_out {
                    return Err(IqError::ArenaOverflow {
                        level: depth + 1,
                        requested: selection.len(),
                        fan_out: level.fan_out,
                    });
                }

                let first_child = end + (index - start) * level.fan_out;
                for (slot, child) in selection.children().enumerate() {
                    let child_index = first_child + slot;
                    let child_node = &mut self.nodes[child_index];
                    child_node.valid = true;
                    child_node.level = depth + 2;
                    child_node.payload = Some(child);
                    child_node.parent = Some(index);
                    self.nodes[index].children[slot] = child_index;
                }
                self.nodes[index].num_children = selection.len();
                self.nodes[index].ratios = selection.ratios();
            }
        }

        self.built = true;
        debug!(
            valid_nodes = self.nodes.iter().filter(|n| n.valid).count(),
            "Interpolation tree built"
        );
        Ok(())
    }

    /// Blends bottom-up from the deepest non-leaf level and returns the root block.
    pub fn interpolate<B>(&mut self, blender: &B) -> Result<&P>
    where
        B: LeafBlender<P> + ?Sized,
    {
        if !self.built {
            return Err(IqError::InvalidArgument(
                "interpolation requested before a successful build".to_string(),
            ));
        }

        let non_leaf = self.level_offsets[self.levels.len()];
        let Self {
            nodes,
            scratch,
            partial,
            ..
        } = self;

        for index in (0..non_leaf).rev() {
            if !nodes[index].valid {
                continue;
            }

            let count = nodes[index].num_children;
            let children = nodes[index].children;
            let ratios = nodes[index].ratios;

            let mut child_data = [NodeData::Unresolved; MAX_CHILDREN];
            for slot in 0..count {
                let child = children[slot];
                child_data[slot] = if child >= non_leaf {
                    let data = nodes[child]
                        .payload
                        .and_then(|payload| payload.leaf_data())
                        .ok_or_else(|| {
                            IqError::InvalidArgument(format!(
                                "leaf node {} carries no parameter data",
                                child
                            ))
                        })?;
                    nodes[child].data = NodeData::Tuning(data);
                    NodeData::Tuning(data)
                } else {
                    nodes[child].data
                };
            }

            if count == 1 && index != 0 {
                nodes[index].data = child_data[0];
                continue;
            }

            let (head, tail) = scratch.split_at_mut(index + 1);
            let out = &mut head[index];
            match count {
                1 => {
                    let only = resolve(child_data[0], tail, index + 1)?;
                    blender.blend(only, only, 0.0, out)?;
                }
                2 => {
                    let first = resolve(child_data[0], tail, index + 1)?;
                    let second = resolve(child_data[1], tail, index + 1)?;
                    blender.blend(first, second, ratios[0], out)?;
                }
                3 => {
                    let first = resolve(child_data[0], tail, index + 1)?;
                    let second = resolve(child_data[1], tail, index + 1)?;
                    let third = resolve(child_data[2], tail, index + 1)?;
                    blender.blend(second, third, ratios[1], partial)?;
                    blender.blend(first, partial, ratios[0], out)?;
                }
                _ => {
                    return Err(IqError::TreeBuildFailure {
                        level: nodes[index].level,
                        node: index,
                    });
                }
            }
            nodes[index].data = NodeData::Scratch(index);
        }

        Ok(&scratch[0])
    }
}

fn resolve<'s, P>(data: NodeData<'s, P>, tail: &'s [P], tail_start: usize) -> Result<&'s P> {
    match data {
        NodeData::Tuning(block) => Ok(block),
        NodeData::Scratch(index) => index
            .checked_sub(tail_start)
            .and_then(|offset| tail.get(offset))
            .ok_or_else(|| {
                IqError::InvalidArgument(format!("scratch block {} not yet interpolated", index))
            }),
        NodeData::Unresolved => Err(IqError::InvalidArgument(
            "child node has no interpolated data".to_string(),
        )),
    }
}
