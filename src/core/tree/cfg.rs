//! Body CFG construction.

use crate::core::analysis::dataflow::DataflowGraph;
use crate::core::tree::Stmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CfgTerminator {
    Goto(BlockId),
    Branch { then_bb: BlockId, else_bb: BlockId },
    /// Abrupt completion (`throw`); never reaches the normal exit.
    Abort,
    /// The normal exit block.
    End,
}

pub struct CfgNode<'a> {
    /// Straight-line statements only (writes, casts, super calls).
    pub items: Vec<&'a Stmt>,
    pub term: CfgTerminator,
}

pub struct Cfg<'a> {
    pub nodes: Vec<CfgNode<'a>>,
    pub entry: BlockId,
    pub exit: BlockId,
    preds: Vec<Vec<BlockId>>,
    succs: Vec<Vec<BlockId>>,
}

impl Cfg<'_> {
    pub fn node(&self, block: BlockId) -> &CfgNode<'_> {
        &self.nodes[block.0]
    }
}

#[derive(Clone, Copy, Debug)]
struct BlockRange {
    entry: BlockId,
    exit: BlockId,
}

pub struct CfgBuilder<'a> {
    nodes: Vec<CfgNode<'a>>,
    succs: Vec<Vec<BlockId>>,
    exit: BlockId,
}

impl Default for CfgBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CfgBuilder<'a> {
    pub fn new() -> Self {
        let mut builder = Self {
            nodes: Vec::new(),
            succs: Vec::new(),
            exit: BlockId(0),
        };
        let _entry = builder.new_block();
        builder.exit = builder.new_block();
        builder.set_term(builder.exit, CfgTerminator::End);
        builder
    }

    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.nodes.len());
        self.nodes.push(CfgNode {
            items: Vec::new(),
            term: CfgTerminator::Abort,
        });
        self.succs.push(Vec::new());
        id
    }

    fn push_edge(&mut self, from: BlockId, to: BlockId) {
        self.succs[from.0].push(to);
    }

    fn set_term(&mut self, block: BlockId, term: CfgTerminator) {
        self.nodes[block.0].term = term;
    }

    fn goto(&mut self, from: BlockId, to: BlockId) {
        self.set_term(from, CfgTerminator::Goto(to));
        self.push_edge(from, to);
    }

    pub fn build_from_body(self, body: &'a [Stmt]) -> Cfg<'a> {
        let mut builder = self;
        let entry = BlockId(0);
        let tail = builder.build_stmts(entry, body);
        // Falling off the end of a body is a normal return.
        let exit = builder.exit;
        builder.goto(tail, exit);
        builder.finish(entry)
    }

    fn build_stmts(&mut self, mut curr_bb: BlockId, stmts: &'a [Stmt]) -> BlockId {
        for stmt in stmts {
            curr_bb = self.handle_stmt(curr_bb, stmt);
        }
        curr_bb
    }

    fn build_nested(&mut self, stmts: &'a [Stmt]) -> BlockRange {
        let entry = self.new_block();
        let exit = self.build_stmts(entry, stmts);
        BlockRange { entry, exit }
    }

    fn handle_stmt(&mut self, curr_bb: BlockId, stmt: &'a Stmt) -> BlockId {
        match stmt {
            Stmt::Assign(_) | Stmt::Cast(_) | Stmt::SuperCall { .. } => {
                self.nodes[curr_bb.0].items.push(stmt);
                curr_bb
            }
            Stmt::If {
                then_body,
                else_body,
                ..
            } => {
                let then_range = self.build_nested(then_body);
                let else_range = self.build_nested(else_body);
                let join = self.new_block();

                self.set_term(
                    curr_bb,
                    CfgTerminator::Branch {
                        then_bb: then_range.entry,
                        else_bb: else_range.entry,
                    },
                );
                self.push_edge(curr_bb, then_range.entry);
                self.push_edge(curr_bb, else_range.entry);

                self.goto(then_range.exit, join);
                self.goto(else_range.exit, join);
                join
            }
            Stmt::While { body, .. } => {
                let cond_bb = self.new_block();
                let body_range = self.build_nested(body);
                let exit_bb = self.new_block();

                self.goto(curr_bb, cond_bb);
                self.set_term(
                    cond_bb,
                    CfgTerminator::Branch {
                        then_bb: body_range.entry,
                        else_bb: exit_bb,
                    },
                );
                self.push_edge(cond_bb, body_range.entry);
                self.push_edge(cond_bb, exit_bb);
                self.goto(body_range.exit, cond_bb);
                exit_bb
            }
            Stmt::Return { .. } => {
                let exit = self.exit;
                self.goto(curr_bb, exit);
                // Anything after a return is dead code.
                self.new_block()
            }
            Stmt::Throw { .. } => {
                self.set_term(curr_bb, CfgTerminator::Abort);
                self.new_block()
            }
        }
    }

    fn finish(self, entry: BlockId) -> Cfg<'a> {
        let mut preds = vec![vec![]; self.nodes.len()];
        for (idx, outs) in self.succs.iter().enumerate() {
            let src = BlockId(idx);
            for &dst in outs {
                preds[dst.0].push(src);
            }
        }

        Cfg {
            nodes: self.nodes,
            entry,
            exit: self.exit,
            preds,
            succs: self.succs,
        }
    }
}

impl DataflowGraph for Cfg<'_> {
    type Node = BlockId;

    fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn index(&self, node: Self::Node) -> usize {
        node.0
    }

    fn preds(&self, node: Self::Node) -> &[Self::Node] {
        &self.preds[node.0]
    }

    fn succs(&self, node: Self::Node) -> &[Self::Node] {
        &self.succs[node.0]
    }
}

#[cfg(test)]
#[path = "../../tests/t_cfg.rs"]
mod tests;
