//! Reversible ledger mutations and the undo/redo invoker.
//!
//! Each fill is a [`FillCommand`]. Its inverse refunds the cash and gives
//! the quantity back, so undoing an older fill leaves later ones in place.
//! Through the invoker undo is LIFO and lands bit-exactly on the pre-fill
//! book. An internal applied flag makes repeated execute/undo calls no-ops.

use chrono::NaiveDateTime;

use super::order::Order;
use super::portfolio::{AuditEntry, AuditEvent, ExecutionContext, FillReceipt};

pub trait Command {
    fn execute(&mut self, ctx: &mut ExecutionContext);
    fn undo(&mut self, ctx: &mut ExecutionContext);
    fn is_applied(&self) -> bool;
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct FillCommand {
    order: Order,
    timestamp: NaiveDateTime,
    strategy: String,
    receipt: Option<FillReceipt>,
}

impl FillCommand {
    /// `order` must already be FILLED; the ledger enforces it on execute.
    pub fn new(order: Order, timestamp: NaiveDateTime, strategy: impl Into<String>) -> Self {
        FillCommand {
            order,
            timestamp,
            strategy: strategy.into(),
            receipt: None,
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    fn audit(&self, event: AuditEvent) -> AuditEntry {
        AuditEntry {
            event,
            timestamp: self.timestamp,
            strategy: self.strategy.clone(),
            symbol: self.order.symbol.clone(),
            signed_quantity: self.order.signed_quantity,
            price: self.order.price,
        }
    }
}

impl Command for FillCommand {
    fn execute(&mut self, ctx: &mut ExecutionContext) {
        if self.receipt.is_some() {
            return;
        }
        self.receipt = Some(ctx.apply_fill(&self.order));
        ctx.record(self.audit(AuditEvent::Execute));
    }

    fn undo(&mut self, ctx: &mut ExecutionContext) {
        let Some(receipt) = self.receipt.take() else {
            return;
        };
        ctx.revert_fill(&self.order, &receipt);
        ctx.record(self.audit(AuditEvent::Undo));
    }

    fn is_applied(&self) -> bool {
        self.receipt.is_some()
    }

    fn describe(&self) -> String {
        format!(
            "{} {} {} @ {}",
            self.strategy, self.order.symbol, self.order.signed_quantity, self.order.price
        )
    }
}

#[derive(Default)]
pub struct CommandInvoker {
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
}

impl CommandInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `cmd`, push it for undo, and drop any redo history.
    pub fn execute(&mut self, mut cmd: Box<dyn Command>, ctx: &mut ExecutionContext) {
        cmd.execute(ctx);
        self.undo_stack.push(cmd);
        self.redo_stack.clear();
    }

    /// Revert the most recent command. None when there is nothing to undo.
    pub fn undo(&mut self, ctx: &mut ExecutionContext) -> Option<&dyn Command> {
        let mut cmd = self.undo_stack.pop()?;
        cmd.undo(ctx);
        self.redo_stack.push(cmd);
        self.redo_stack.last().map(|c| c.as_ref())
    }

    /// Re-apply the most recently undone command.
    pub fn redo(&mut self, ctx: &mut ExecutionContext) -> Option<&dyn Command> {
        let mut cmd = self.redo_stack.pop()?;
        cmd.execute(ctx);
        self.undo_stack.push(cmd);
        self.undo_stack.last().map(|c| c.as_ref())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}
