//! # Kanban Board
//!
//! Column state for the sales and support pipelines, with optimistic
//! stage moves.
//!
//! ## Optimistic Move Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  drop card ──► begin_move ──► board shows the new column immediately   │
//! │                    │          state: Pending (previous slot recorded)   │
//! │                    │                                                    │
//! │             PATCH /clients/:id { stageId }                             │
//! │                    │                                                    │
//! │          ┌─────────┴──────────┐                                        │
//! │          ▼                    ▼                                        │
//! │      2xx: commit         error: rollback                               │
//! │   state: Committed     card back in its previous slot                  │
//! │                        state: RolledBack                               │
//! │                                                                         │
//! │  One pending move per card; moves of different cards are independent. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use crm_core::kanban::{KanbanBoard, MoveState};
//! use crm_core::types::{KanbanStage, PipelineKind};
//!
//! let stage = |id: &str, position| KanbanStage {
//!     id: id.to_string(),
//!     name: id.to_string(),
//!     pipeline: PipelineKind::Sales,
//!     position,
//!     color: None,
//! };
//! let mut board = KanbanBoard::new(vec![stage("lead", 0), stage("won", 1)]);
//! board.place("c-1", "lead").unwrap();
//!
//! board.begin_move("c-1", "won", 0).unwrap();
//! assert_eq!(board.stage_of("c-1"), Some("won"));
//!
//! // The API call failed
//! board.rollback("c-1").unwrap();
//! assert_eq!(board.stage_of("c-1"), Some("lead"));
//! assert_eq!(board.move_state("c-1"), Some(MoveState::RolledBack));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Client, KanbanStage};

// =============================================================================
// Card and Move Types
// =============================================================================

/// A card as rendered in a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct KanbanCard {
    /// Id of the entity on the card (client or enrollment).
    pub id: String,
    pub stage_id: String,
    /// Zero-based, contiguous within the stage.
    pub position: usize,
}

/// Where a card sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLocation {
    pub stage_id: String,
    pub index: usize,
}

/// Outcome of the latest move of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    /// Applied locally, server has not answered.
    Pending,
    /// Server accepted the move.
    Committed,
    /// Server rejected the move; the card went back.
    RolledBack,
}

/// A move applied locally and awaiting the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub card_id: String,
    pub from: CardLocation,
    pub to: CardLocation,
    pub started_at: DateTime<Utc>,
}

// =============================================================================
// Board
// =============================================================================

/// Columns of one pipeline and the cards in them.
#[derive(Debug, Clone, Default)]
pub struct KanbanBoard {
    /// Sorted by `position`.
    stages: Vec<KanbanStage>,
    /// Card ids per stage, in display order.
    columns: HashMap<String, Vec<String>>,
    pending: HashMap<String, PendingMove>,
    states: HashMap<String, MoveState>,
}

impl KanbanBoard {
    /// Creates an empty board with the given columns.
    pub fn new(mut stages: Vec<KanbanStage>) -> Self {
        stages.sort_by_key(|s| s.position);
        let columns = stages.iter().map(|s| (s.id.clone(), Vec::new())).collect();
        KanbanBoard {
            stages,
            columns,
            ..KanbanBoard::default()
        }
    }

    /// Builds the sales board from clients.
    ///
    /// Clients without a stage, or with a stage that is not on the board,
    /// land in the first column.
    pub fn from_clients(stages: Vec<KanbanStage>, clients: &[Client]) -> Self {
        let mut board = KanbanBoard::new(stages);
        let first = board.stages.first().map(|s| s.id.clone());

        for client in clients {
            let stage = client
                .stage_id
                .as_deref()
                .filter(|id| board.columns.contains_key(*id))
                .or(first.as_deref());
            if let Some(stage) = stage {
                board.append(&client.id, stage);
            }
        }
        board
    }

    fn append(&mut self, card_id: &str, stage_id: &str) {
        if let Some(column) = self.columns.get_mut(stage_id) {
            column.push(card_id.to_string());
        }
    }

    /// Adds a card at the end of a column, or moves it there if it is
    /// already on the board. Not an optimistic move: a pending move of the
    /// card is dropped, so a late rollback cannot undo the placement.
    pub fn place(&mut self, card_id: &str, stage_id: &str) -> CoreResult<()> {
        if !self.columns.contains_key(stage_id) {
            return Err(CoreError::StageNotFound(stage_id.to_string()));
        }
        self.detach(card_id);
        self.append(card_id, stage_id);
        self.pending.remove(card_id);
        self.states.remove(card_id);
        Ok(())
    }

    /// Takes a card off the board, dropping any pending move.
    pub fn remove(&mut self, card_id: &str) -> CoreResult<()> {
        if self.detach(card_id).is_none() {
            return Err(CoreError::CardNotFound(card_id.to_string()));
        }
        self.pending.remove(card_id);
        self.states.remove(card_id);
        Ok(())
    }

    /// Removes the card from its column, returning where it was.
    fn detach(&mut self, card_id: &str) -> Option<CardLocation> {
        let location = self.locate(card_id)?;
        if let Some(column) = self.columns.get_mut(&location.stage_id) {
            column.remove(location.index);
        }
        Some(location)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Columns, left to right.
    pub fn stages(&self) -> &[KanbanStage] {
        &self.stages
    }

    /// Where a card currently sits.
    pub fn locate(&self, card_id: &str) -> Option<CardLocation> {
        self.columns.iter().find_map(|(stage_id, cards)| {
            cards.iter().position(|c| c == card_id).map(|index| CardLocation {
                stage_id: stage_id.clone(),
                index,
            })
        })
    }

    /// Stage id of a card.
    pub fn stage_of(&self, card_id: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, cards)| cards.iter().any(|c| c == card_id))
            .map(|(stage_id, _)| stage_id.as_str())
    }

    /// Cards of one column in display order; empty for unknown stages.
    pub fn cards_in(&self, stage_id: &str) -> Vec<KanbanCard> {
        self.columns
            .get(stage_id)
            .map(|cards| {
                cards
                    .iter()
                    .enumerate()
                    .map(|(position, id)| KanbanCard {
                        id: id.clone(),
                        stage_id: stage_id.to_string(),
                        position,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of cards per stage, left to right.
    pub fn column_counts(&self) -> Vec<(&str, usize)> {
        self.stages
            .iter()
            .map(|s| (s.id.as_str(), self.columns.get(&s.id).map_or(0, Vec::len)))
            .collect()
    }

    /// State of the latest move of a card; `None` if it never moved.
    pub fn move_state(&self, card_id: &str) -> Option<MoveState> {
        self.states.get(card_id).copied()
    }

    /// Moves still waiting for the server.
    pub fn pending_moves(&self) -> impl Iterator<Item = &PendingMove> {
        self.pending.values()
    }

    // -------------------------------------------------------------------------
    // Optimistic moves
    // -------------------------------------------------------------------------

    /// Moves a card to `to_index` of `to_stage` right away and records the
    /// move as pending.
    ///
    /// ## Errors
    /// - `MoveAlreadyPending` if the card's previous move is unresolved
    /// - `CardNotFound` / `StageNotFound`
    /// - `PositionOutOfBounds` if `to_index` is past the end of the column
    pub fn begin_move(
        &mut self,
        card_id: &str,
        to_stage: &str,
        to_index: usize,
    ) -> CoreResult<PendingMove> {
        if self.pending.contains_key(card_id) {
            return Err(CoreError::MoveAlreadyPending(card_id.to_string()));
        }
        let from = self
            .locate(card_id)
            .ok_or_else(|| CoreError::CardNotFound(card_id.to_string()))?;
        let target_len = self
            .columns
            .get(to_stage)
            .map(Vec::len)
            .ok_or_else(|| CoreError::StageNotFound(to_stage.to_string()))?;

        // The card leaves its own column before it is reinserted
        let max_index = if from.stage_id == to_stage {
            target_len - 1
        } else {
            target_len
        };
        if to_index > max_index {
            return Err(CoreError::PositionOutOfBounds {
                stage_id: to_stage.to_string(),
                index: to_index,
                len: max_index,
            });
        }

        self.detach(card_id);
        self.insert(card_id, to_stage, to_index);

        let pending = PendingMove {
            card_id: card_id.to_string(),
            from,
            to: CardLocation {
                stage_id: to_stage.to_string(),
                index: to_index,
            },
            started_at: Utc::now(),
        };
        tracing::debug!(
            card_id,
            from_stage = %pending.from.stage_id,
            to_stage,
            to_index,
            "optimistic move started"
        );

        self.pending.insert(card_id.to_string(), pending.clone());
        self.states.insert(card_id.to_string(), MoveState::Pending);
        Ok(pending)
    }

    fn insert(&mut self, card_id: &str, stage_id: &str, index: usize) {
        if let Some(column) = self.columns.get_mut(stage_id) {
            let index = index.min(column.len());
            column.insert(index, card_id.to_string());
        }
    }

    /// Marks the card's pending move as accepted by the server.
    pub fn commit(&mut self, card_id: &str) -> CoreResult<PendingMove> {
        let pending = self
            .pending
            .remove(card_id)
            .ok_or_else(|| CoreError::NoPendingMove(card_id.to_string()))?;

        self.states.insert(card_id.to_string(), MoveState::Committed);
        tracing::debug!(card_id, to_stage = %pending.to.stage_id, "move committed");
        Ok(pending)
    }

    /// Puts the card back where it was before its pending move.
    ///
    /// If the previous column got shorter in the meantime, the card goes
    /// to its end.
    pub fn rollback(&mut self, card_id: &str) -> CoreResult<PendingMove> {
        let pending = self
            .pending
            .remove(card_id)
            .ok_or_else(|| CoreError::NoPendingMove(card_id.to_string()))?;

        self.detach(card_id);
        self.insert(card_id, &pending.from.stage_id, pending.from.index);
        self.states.insert(card_id.to_string(), MoveState::RolledBack);

        tracing::warn!(
            card_id,
            from_stage = %pending.from.stage_id,
            to_stage = %pending.to.stage_id,
            "move rolled back"
        );
        Ok(pending)
    }

    /// Resolves a pending move from the server's answer: commit on `Ok`,
    /// roll back on `Err`.
    pub fn settle<T, E: fmt::Display>(
        &mut self,
        card_id: &str,
        outcome: Result<T, E>,
    ) -> CoreResult<MoveState> {
        match outcome {
            Ok(_) => self.commit(card_id).map(|_| MoveState::Committed),
            Err(err) => {
                tracing::warn!(card_id, error = %err, "server rejected move");
                self.rollback(card_id).map(|_| MoveState::RolledBack)
            }
        }
    }

    /// Reorders a card within one column (drag inside the column).
    pub fn reorder(&mut self, stage_id: &str, from: usize, to: usize) -> CoreResult<()> {
        let column = self
            .columns
            .get_mut(stage_id)
            .ok_or_else(|| CoreError::StageNotFound(stage_id.to_string()))?;

        let len = column.len();
        if let Some(index) = [from, to].into_iter().find(|i| *i >= len) {
            return Err(CoreError::PositionOutOfBounds {
                stage_id: stage_id.to_string(),
                index,
                len,
            });
        }

        let card = column.remove(from);
        column.insert(to, card);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
