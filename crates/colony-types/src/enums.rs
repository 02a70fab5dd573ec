//! Enumeration types for the Colony engine.
//!
//! Fixed vocabularies shared across crates: event categories, job
//! designations, task and mission kinds, and the phase tags their state
//! machines step through.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event categories
// ---------------------------------------------------------------------------

/// The category of a [`HistoricalEvent`](crate::HistoricalEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Illness, injury, or medical treatment.
    Medical,
    /// Equipment or vehicle failure.
    Malfunction,
    /// Mission lifecycle: started, joined, completed, aborted.
    Mission,
    /// Noteworthy task completion.
    Task,
    /// Vehicle departures and arrivals.
    Transport,
}

impl EventCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Medical,
        Self::Malfunction,
        Self::Mission,
        Self::Task,
        Self::Transport,
    ];

    /// Lowercase name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Medical => "medical",
            Self::Malfunction => "malfunction",
            Self::Mission => "mission",
            Self::Task => "task",
            Self::Transport => "transport",
        }
    }
}

impl core::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// A settler's job designation. Jobs bias which tasks and missions an
/// agent is drawn to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobKind {
    /// Keeps equipment running and builds structures.
    Engineer,
    /// Grows food in the greenhouses.
    Botanist,
    /// Treats the sick and injured.
    Doctor,
    /// Drives rovers on resupply and rescue runs.
    Pilot,
    /// Runs experiments and field surveys.
    Scientist,
    /// Negotiates with other settlements.
    Trader,
    /// No designation yet.
    Unassigned,
}

impl JobKind {
    /// Every job, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Engineer,
        Self::Botanist,
        Self::Doctor,
        Self::Pilot,
        Self::Scientist,
        Self::Trader,
        Self::Unassigned,
    ];

    /// Lowercase name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Engineer => "engineer",
            Self::Botanist => "botanist",
            Self::Doctor => "doctor",
            Self::Pilot => "pilot",
            Self::Scientist => "scientist",
            Self::Trader => "trader",
            Self::Unassigned => "unassigned",
        }
    }
}

impl core::fmt::Display for JobKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// A short-lived activity an agent performs alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Sleep off fatigue.
    Sleep,
    /// Prepare and eat a meal.
    EatMeal,
    /// Unwind to reduce stress.
    Relax,
    /// Inspect and service settlement equipment.
    Maintenance,
    /// Lab work.
    Research,
    /// Tend crops in a greenhouse.
    TendGreenhouse,
    /// Routine medical examination of the settlement crew.
    MedicalCheckup,
    /// A short walk around the settlement.
    Walk,
}

impl TaskKind {
    /// Lowercase name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::EatMeal => "eat meal",
            Self::Relax => "relax",
            Self::Maintenance => "maintenance",
            Self::Research => "research",
            Self::TendGreenhouse => "tend greenhouse",
            Self::MedicalCheckup => "medical checkup",
            Self::Walk => "walk",
        }
    }
}

impl core::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A step within a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskPhase {
    /// Moving to where the work happens.
    Walking,
    /// Getting tools, food, or a bunk ready.
    Preparing,
    /// The main work of the task.
    Working,
    /// Sleeping or relaxing.
    Resting,
    /// Eating.
    Eating,
    /// Putting things away.
    CleaningUp,
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// A long-lived activity shared by several agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MissionKind {
    /// Survey a remote site and collect samples.
    Exploration,
    /// Build a structure near the settlement.
    Construction,
    /// Haul supplies from a landing site.
    Resupply,
    /// Exchange goods with a neighbouring settlement.
    Trade,
    /// Recover a stranded crew.
    Rescue,
}

impl MissionKind {
    /// Every mission kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Exploration,
        Self::Construction,
        Self::Resupply,
        Self::Trade,
        Self::Rescue,
    ];

    /// Lowercase name used in logs and event descriptions.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Construction => "construction",
            Self::Resupply => "resupply",
            Self::Trade => "trade",
            Self::Rescue => "rescue",
        }
    }
}

impl core::fmt::Display for MissionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A named step in a mission's state machine.
///
/// Each mission kind walks a kind-specific ordered subsequence of these
/// phases, always starting at [`Embarking`](Self::Embarking) and ending at
/// [`Done`](Self::Done). [`Aborted`](Self::Aborted) is reachable from any
/// non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MissionPhase {
    /// Forming the crew and preparing to leave.
    Embarking,
    /// Loading cargo onto the vehicle.
    Loading,
    /// Driving out to the mission site.
    Travelling,
    /// Surveying and collecting samples on site.
    Exploring,
    /// Building on site.
    Constructing,
    /// Exchanging goods with another settlement.
    Trading,
    /// Recovering a stranded crew.
    Rescuing,
    /// Unloading cargo.
    Unloading,
    /// Driving home.
    Returning,
    /// Stowing gear and dispersing the crew.
    Disembarking,
    /// Completed successfully. Terminal.
    Done,
    /// Ended early. Terminal.
    Aborted,
}

impl MissionPhase {
    /// Whether this phase ends the mission.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Whether the crew is out on a vehicle during this phase.
    pub const fn is_travel(self) -> bool {
        matches!(self, Self::Travelling | Self::Returning)
    }

    /// Lowercase name used in logs and event descriptions.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Embarking => "embarking",
            Self::Loading => "loading",
            Self::Travelling => "travelling",
            Self::Exploring => "exploring",
            Self::Constructing => "constructing",
            Self::Trading => "trading",
            Self::Rescuing => "rescuing",
            Self::Unloading => "unloading",
            Self::Returning => "returning",
            Self::Disembarking => "disembarking",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl core::fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
