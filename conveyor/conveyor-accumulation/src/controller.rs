//! Zero-pressure gating of the sensor chain.
//!
//! The controller keeps every registered beam in a chain ordered by tag.
//! The lowest tag is the *head*, nearest the discharge end. Each beam is a
//! holding slot:
//!
//! - A load entering the head is held unless the release input is on.
//! - A load entering any other beam is held only if the next beam toward
//!   discharge (its predecessor) is occupied.
//! - A load leaving a beam frees that beam and the next beam upstream (its
//!   successor), so the load behind becomes free to move up.
//! - Switching the release input on frees the head.
//!
//! The controller never moves loads. It only decides which beams hold what;
//! the physics engine reports the resulting movement back as new events.
//!
//! # Storage
//!
//! Records live in a dense array in registration order. A separate index
//! array holds the chain order and is re-sorted after every structural
//! change, so lookups go through indices and never alias.

use std::cmp::Ordering;

use conveyor_types::{Beam, LoadId, SensorId, SensorTag};
use tracing::{debug, trace};

/// Read/write access to beams by id.
///
/// The controller does not own beams; whoever owns them lends them for the
/// duration of one decision.
pub trait SensorBank {
    /// Looks up a beam.
    fn beam(&self, id: SensorId) -> Option<&Beam>;

    /// Looks up a beam mutably.
    fn beam_mut(&mut self, id: SensorId) -> Option<&mut Beam>;
}

impl SensorBank for [Beam] {
    fn beam(&self, id: SensorId) -> Option<&Beam> {
        self.iter().find(|beam| beam.id() == id)
    }

    fn beam_mut(&mut self, id: SensorId) -> Option<&mut Beam> {
        self.iter_mut().find(|beam| beam.id() == id)
    }
}

/// Outcome of a load entering a beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateDecision {
    /// The beam holds the load.
    Hold,
    /// The load is allowed through.
    Pass,
    /// The beam is not part of this chain.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct SensorRecord {
    id: SensorId,
    tag: Option<SensorTag>,
}

/// Missing tags rank equal to everything so a stable sort leaves them where
/// they are.
fn compare(a: &SensorRecord, b: &SensorRecord) -> Ordering {
    match (a.tag, b.tag) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// Sorted sensor chain and the cascading hold/release rules.
///
/// # Example
///
/// ```
/// use conveyor_accumulation::{Controller, GateDecision};
/// use conveyor_types::{Beam, LoadId, SensorTag};
///
/// let mut controller = Controller::new();
/// let mut beams = Vec::new();
/// for tag in [1, 0] {
///     let mut beam = Beam::new(controller.allocate_id(), format!("Sensor {tag}"));
///     beam.assign_tag(SensorTag::new(tag)).unwrap();
///     controller.add(&beam);
///     beams.push(beam);
/// }
///
/// // Head is the beam tagged 0.
/// let head = beams[1].id();
/// assert_eq!(controller.head(), Some(head));
///
/// beams[1].load_entered(LoadId::new(1));
/// let decision = controller.on_entering(head, LoadId::new(1), false, &mut beams[..]);
/// assert_eq!(decision, GateDecision::Hold);
/// ```
#[derive(Debug, Default)]
pub struct Controller {
    records: Vec<SensorRecord>,
    order: Vec<usize>,
    next_id: u64,
}

impl Controller {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a sensor id unique within this controller.
    pub fn allocate_id(&mut self) -> SensorId {
        let id = SensorId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Registers a beam and re-sorts the chain.
    ///
    /// Returns `false` if the beam was already registered.
    pub fn add(&mut self, sensor: &Beam) -> bool {
        if self.contains(sensor.id()) {
            return false;
        }
        self.records.push(SensorRecord {
            id: sensor.id(),
            tag: sensor.tag(),
        });
        self.order.push(self.records.len() - 1);
        self.sort();
        debug!(sensor = %sensor.id(), tag = ?sensor.tag(), len = self.len(), "sensor registered");
        true
    }

    /// Deregisters a beam and re-sorts the chain.
    ///
    /// Returns `false` if the beam was not registered.
    pub fn remove(&mut self, sensor: SensorId) -> bool {
        let Some(slot) = self.records.iter().position(|r| r.id == sensor) else {
            return false;
        };
        self.records.remove(slot);
        self.order.retain(|&i| i != slot);
        for i in &mut self.order {
            if *i > slot {
                *i -= 1;
            }
        }
        self.sort();
        debug!(sensor = %sensor, len = self.len(), "sensor deregistered");
        true
    }

    /// Whether a beam is registered.
    #[must_use]
    pub fn contains(&self, sensor: SensorId) -> bool {
        self.records.iter().any(|r| r.id == sensor)
    }

    /// Number of registered beams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no beam is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Beam ids in chain order, head first.
    pub fn chain(&self) -> impl Iterator<Item = SensorId> + '_ {
        self.order.iter().map(|&i| self.records[i].id)
    }

    /// Tags in chain order, head first.
    #[must_use]
    pub fn tags(&self) -> Vec<Option<SensorTag>> {
        self.order.iter().map(|&i| self.records[i].tag).collect()
    }

    /// The beam nearest discharge.
    #[must_use]
    pub fn head(&self) -> Option<SensorId> {
        self.order.first().map(|&i| self.records[i].id)
    }

    /// The beam one step toward discharge from `sensor`.
    #[must_use]
    pub fn predecessor(&self, sensor: SensorId) -> Option<SensorId> {
        let rank = self.rank(sensor)?;
        let previous = rank.checked_sub(1)?;
        Some(self.records[self.order[previous]].id)
    }

    /// The beam one step upstream from `sensor`.
    #[must_use]
    pub fn successor(&self, sensor: SensorId) -> Option<SensorId> {
        let rank = self.rank(sensor)?;
        self.order.get(rank + 1).map(|&i| self.records[i].id)
    }

    fn rank(&self, sensor: SensorId) -> Option<usize> {
        self.order.iter().position(|&i| self.records[i].id == sensor)
    }

    /// Stable insertion sort of the current chain order.
    ///
    /// Tolerates the non-total order produced by missing tags and leaves an
    /// already sorted chain untouched.
    fn sort(&mut self) {
        for i in 1..self.order.len() {
            let mut j = i;
            while j > 0
                && compare(&self.records[self.order[j - 1]], &self.records[self.order[j]])
                    == Ordering::Greater
            {
                self.order.swap(j - 1, j);
                j -= 1;
            }
        }
        trace!(tags = ?self.tags(), "sensor chain sorted");
    }

    /// Decides whether `sensor` holds `load`, which has just entered it.
    ///
    /// `release_active` is the level of the release input at this instant.
    pub fn on_entering<B>(
        &self,
        sensor: SensorId,
        load: LoadId,
        release_active: bool,
        bank: &mut B,
    ) -> GateDecision
    where
        B: SensorBank + ?Sized,
    {
        let Some(rank) = self.rank(sensor) else {
            return GateDecision::Ignored;
        };

        let hold = match rank.checked_sub(1) {
            None => !release_active,
            Some(previous) => {
                let predecessor = self.records[self.order[previous]].id;
                bank.beam(predecessor).is_some_and(Beam::is_active)
            }
        };

        if !hold {
            debug!(sensor = %sensor, load = %load, rank, "load passes");
            return GateDecision::Pass;
        }

        match bank.beam_mut(sensor) {
            Some(beam) => {
                beam.attach(load);
                debug!(sensor = %sensor, load = %load, rank, "load held");
                GateDecision::Hold
            }
            None => GateDecision::Ignored,
        }
    }

    /// Frees `sensor` and its successor after `load` left `sensor`.
    ///
    /// Returns the released loads, those of `sensor` first.
    pub fn on_leaving<B>(&self, sensor: SensorId, load: LoadId, bank: &mut B) -> Vec<LoadId>
    where
        B: SensorBank + ?Sized,
    {
        let Some(rank) = self.rank(sensor) else {
            return Vec::new();
        };

        let mut released = bank.beam_mut(sensor).map(Beam::unattach_all).unwrap_or_default();
        if let Some(&next) = self.order.get(rank + 1) {
            let successor = self.records[next].id;
            if let Some(beam) = bank.beam_mut(successor) {
                released.extend(beam.unattach_all());
            }
        }

        debug!(sensor = %sensor, load = %load, released = released.len(), "sensor cleared");
        released
    }

    /// Frees the head after a rising edge of the release input.
    ///
    /// Returns the released loads.
    pub fn on_release<B>(&self, bank: &mut B) -> Vec<LoadId>
    where
        B: SensorBank + ?Sized,
    {
        let released = self
            .head()
            .and_then(|head| bank.beam_mut(head))
            .map(Beam::unattach_all)
            .unwrap_or_default();
        debug!(released = released.len(), "release edge");
        released
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    /// Registers beams with the given tags, in the given order.
    fn chain(tags: &[u32]) -> (Controller, Vec<Beam>) {
        let mut controller = Controller::new();
        let mut beams = Vec::new();
        for &tag in tags {
            let mut beam = Beam::new(controller.allocate_id(), format!("Sensor {tag}"));
            beam.assign_tag(SensorTag::new(tag)).unwrap();
            controller.add(&beam);
            beams.push(beam);
        }
        (controller, beams)
    }

    fn id_of(beams: &[Beam], tag: u32) -> SensorId {
        beams
            .iter()
            .find(|b| b.tag() == Some(SensorTag::new(tag)))
            .map(Beam::id)
            .unwrap()
    }

    fn raw_tags(controller: &Controller) -> Vec<u32> {
        controller.tags().into_iter().map(|t| t.unwrap().raw()).collect()
    }

    #[test]
    fn test_add_sorts_by_tag() {
        let (controller, _) = chain(&[2, 0, 3, 1]);
        assert_eq!(raw_tags(&controller), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let (mut controller, beams) = chain(&[0, 1]);
        assert!(!controller.add(&beams[0]));
        assert_eq!(controller.len(), 2);
    }

    #[test]
    fn test_remove_keeps_order() {
        let (mut controller, beams) = chain(&[3, 1, 0, 2]);
        assert!(controller.remove(id_of(&beams, 1)));
        assert_eq!(raw_tags(&controller), vec![0, 2, 3]);
        assert!(!controller.remove(id_of(&beams, 1)));

        assert!(controller.remove(id_of(&beams, 0)));
        assert_eq!(controller.head(), Some(id_of(&beams, 2)));
    }

    #[test]
    fn test_neighbors() {
        let (controller, beams) = chain(&[0, 1, 2]);
        let middle = id_of(&beams, 1);
        assert_eq!(controller.predecessor(middle), Some(id_of(&beams, 0)));
        assert_eq!(controller.successor(middle), Some(id_of(&beams, 2)));
        assert_eq!(controller.predecessor(id_of(&beams, 0)), None);
        assert_eq!(controller.successor(id_of(&beams, 2)), None);
    }

    #[test]
    fn test_untagged_sensor_keeps_position() {
        let mut controller = Controller::new();
        let mut tagged = Beam::new(controller.allocate_id(), "a");
        tagged.assign_tag(SensorTag::new(5)).unwrap();
        let untagged = Beam::new(controller.allocate_id(), "b");
        let mut low = Beam::new(controller.allocate_id(), "c");
        low.assign_tag(SensorTag::new(1)).unwrap();

        controller.add(&tagged);
        controller.add(&untagged);
        controller.add(&low);

        // The untagged beam blocks the low tag from moving past it.
        let order: Vec<_> = controller.chain().collect();
        assert_eq!(order, vec![tagged.id(), untagged.id(), low.id()]);
    }

    #[test]
    fn test_head_holds_unless_released() {
        let (controller, mut beams) = chain(&[0, 1]);
        let head = id_of(&beams, 0);

        let decision = controller.on_entering(head, LoadId::new(1), true, &mut beams[..]);
        assert_eq!(decision, GateDecision::Pass);

        let decision = controller.on_entering(head, LoadId::new(1), false, &mut beams[..]);
        assert_eq!(decision, GateDecision::Hold);
        assert_eq!(beams.as_slice().beam(head).unwrap().attached(), &[LoadId::new(1)]);
    }

    #[test]
    fn test_middle_holds_only_behind_occupied_slot() {
        let (controller, mut beams) = chain(&[0, 1, 2]);
        let head = id_of(&beams, 0);
        let middle = id_of(&beams, 1);

        let decision = controller.on_entering(middle, LoadId::new(2), false, &mut beams[..]);
        assert_eq!(decision, GateDecision::Pass);

        beams.as_mut_slice().beam_mut(head).unwrap().load_entered(LoadId::new(1));
        let decision = controller.on_entering(middle, LoadId::new(2), false, &mut beams[..]);
        assert_eq!(decision, GateDecision::Hold);
    }

    #[test]
    fn test_leaving_frees_self_and_successor() {
        let (controller, mut beams) = chain(&[0, 1, 2]);
        let (head, middle, tail) = (id_of(&beams, 0), id_of(&beams, 1), id_of(&beams, 2));
        beams.as_mut_slice().beam_mut(head).unwrap().attach(LoadId::new(1));
        beams.as_mut_slice().beam_mut(middle).unwrap().attach(LoadId::new(2));
        beams.as_mut_slice().beam_mut(tail).unwrap().attach(LoadId::new(3));

        let released = controller.on_leaving(head, LoadId::new(1), &mut beams[..]);
        assert_eq!(released, vec![LoadId::new(1), LoadId::new(2)]);
        assert_eq!(beams.as_slice().beam(tail).unwrap().attached(), &[LoadId::new(3)]);

        // Tail has no successor; nothing else happens.
        let released = controller.on_leaving(tail, LoadId::new(3), &mut beams[..]);
        assert_eq!(released, vec![LoadId::new(3)]);
    }

    #[test]
    fn test_release_frees_head_only() {
        let (controller, mut beams) = chain(&[0, 1]);
        let (head, tail) = (id_of(&beams, 0), id_of(&beams, 1));
        beams.as_mut_slice().beam_mut(head).unwrap().attach(LoadId::new(1));
        beams.as_mut_slice().beam_mut(tail).unwrap().attach(LoadId::new(2));

        assert_eq!(controller.on_release(&mut beams[..]), vec![LoadId::new(1)]);
        assert_eq!(beams.as_slice().beam(tail).unwrap().attached(), &[LoadId::new(2)]);
    }

    #[test]
    fn test_unregistered_sensor_is_ignored() {
        let (mut controller, mut beams) = chain(&[0]);
        let stranger = Beam::new(controller.allocate_id(), "stranger");
        beams.push(stranger);
        let id = beams[1].id();

        let decision = controller.on_entering(id, LoadId::new(1), false, &mut beams[..]);
        assert_eq!(decision, GateDecision::Ignored);
        assert!(controller.on_leaving(id, LoadId::new(1), &mut beams[..]).is_empty());
    }

    #[test]
    fn test_empty_chain_release() {
        let controller = Controller::new();
        let mut beams: Vec<Beam> = Vec::new();
        assert!(controller.on_release(&mut beams[..]).is_empty());
        assert_eq!(controller.head(), None);
    }
}
