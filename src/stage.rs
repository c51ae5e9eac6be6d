//! Viewer stage
//!
//! Owns the renderer and the slot collection for the round on screen. Molecule
//! files arrive asynchronously and in any order; each slot is styled and
//! oriented only once its own file has arrived, and arrivals for an earlier
//! round are dropped.

use std::collections::HashMap;

use crate::assets::{AssetSource, MoleculeCache};
use crate::molecule::FALLBACK_MOL2;
use crate::renderer::Renderer;
use crate::settings::{RenderStyle, Settings};
use crate::sim::{RotationPlan, RoundId, RoundView, SlotRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Pending,
    Ready,
    /// Neither the file nor the fallback could be shown
    Failed,
}

#[derive(Debug, Clone)]
struct Slot {
    request: SlotRequest,
    status: SlotStatus,
}

pub struct Stage<R: Renderer> {
    renderer: R,
    round: Option<RoundId>,
    slots: HashMap<String, Slot>,
    style: RenderStyle,
    axis_twist: bool,
}

impl<R: Renderer> Stage<R> {
    pub fn new(renderer: R, settings: &Settings) -> Self {
        Self {
            renderer,
            round: None,
            slots: HashMap::new(),
            style: settings.style,
            axis_twist: settings.axis_twist,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn round(&self) -> Option<RoundId> {
        self.round
    }

    /// Forget the previous round and expect the new round's slots
    pub fn begin_round(&mut self, view: &RoundView) {
        for slot in self.slots.keys() {
            self.renderer.clear(slot);
        }
        self.slots = view
            .slots
            .iter()
            .map(|request| {
                (
                    request.slot.clone(),
                    Slot {
                        request: request.clone(),
                        status: SlotStatus::Pending,
                    },
                )
            })
            .collect();
        self.round = Some(view.round);
    }

    /// Drop every slot (session over)
    pub fn clear(&mut self) {
        for slot in self.slots.keys() {
            self.renderer.clear(slot);
        }
        self.slots.clear();
        self.round = None;
    }

    /// A slot's file arrived. Returns false when it was for a stale round,
    /// an unknown slot, or a slot that is already shown.
    pub fn slot_loaded(&mut self, round: RoundId, slot_id: &str, mol2: &str) -> bool {
        if self.round != Some(round) {
            log::debug!("Dropping '{slot_id}' from stale round {}", round.0);
            return false;
        }
        let Some(slot) = self.slots.get_mut(slot_id) else {
            log::debug!("Unknown slot '{slot_id}'");
            return false;
        };
        if slot.status != SlotStatus::Pending {
            return false;
        }

        if let Err(e) = self.renderer.load_model(slot_id, mol2) {
            log::warn!("'{}' failed to load ({e}), using fallback", slot.request.path);
            if let Err(e) = self.renderer.load_model(slot_id, FALLBACK_MOL2) {
                log::error!("Fallback molecule rejected for '{slot_id}': {e}");
                slot.status = SlotStatus::Failed;
                return false;
            }
        }

        self.renderer.set_style(slot_id, self.style);
        RotationPlan::for_slot(
            slot_id,
            &slot.request.path,
            slot.request.index,
            self.axis_twist,
        )
        .apply(&mut self.renderer, slot_id);
        self.renderer.zoom_to_fit(slot_id);
        self.renderer.render(slot_id);

        slot.status = SlotStatus::Ready;
        true
    }

    pub fn status(&self, slot: &str) -> Option<SlotStatus> {
        self.slots.get(slot).map(|s| s.status)
    }

    /// Every slot of the current round has been handled
    pub fn is_complete(&self) -> bool {
        self.round.is_some() && self.slots.values().all(|s| s.status != SlotStatus::Pending)
    }

    /// Fetch and show every slot of `view`, one after another
    pub async fn load_round<S: AssetSource + ?Sized>(
        &mut self,
        view: &RoundView,
        cache: &MoleculeCache,
        source: &S,
    ) {
        self.begin_round(view);
        for request in &view.slots {
            let text = cache.load(source, &request.path).await;
            self.slot_loaded(view.round, &request.slot, &text);
        }
    }
}
