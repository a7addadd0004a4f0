use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{FrameError, FrameResult},
    model::ids::{AssignmentId, ChildId, EventId, GiftId, GuestId, TemplateId},
};

/// Specificity level of an assignment's scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Whole event.
    Event,
    /// One child within an event.
    Child,
    /// One guest, optionally within an event.
    Guest,
    /// One gift.
    Gift,
}

impl Tier {
    /// Fixed priority; not independently settable.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Event => 25,
            Self::Child => 50,
            Self::Guest => 75,
            Self::Gift => 100,
        }
    }
}

/// Flat persisted scope columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeFields {
    /// Event column.
    #[serde(default)]
    pub event_id: Option<EventId>,
    /// Child column.
    #[serde(default)]
    pub child_id: Option<ChildId>,
    /// Guest column.
    #[serde(default)]
    pub guest_id: Option<GuestId>,
    /// Gift column.
    #[serde(default)]
    pub gift_id: Option<GiftId>,
}

/// Exactly one meaningful scope combination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum AssignmentScope {
    /// Event-wide.
    Event {
        /// Event.
        event_id: EventId,
    },
    /// One child within an event.
    Child {
        /// Event.
        event_id: EventId,
        /// Child.
        child_id: ChildId,
    },
    /// One guest, optionally tied to an event for traceability.
    Guest {
        /// Guest.
        guest_id: GuestId,
        /// Event, if known.
        #[serde(default)]
        event_id: Option<EventId>,
    },
    /// One gift.
    Gift {
        /// Gift.
        gift_id: GiftId,
    },
}

/// Exclusivity unit: at most one active assignment per bucket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    /// Event and child tiers share `(event, child-or-none)`.
    EventChild(EventId, Option<ChildId>),
    /// Guest tier: `(guest, event-or-none)`.
    Guest(GuestId, Option<EventId>),
    /// Gift tier.
    Gift(GiftId),
}

impl AssignmentScope {
    /// Event-wide scope.
    pub fn event(event_id: impl Into<String>) -> Self {
        Self::Event {
            event_id: EventId::new(event_id),
        }
    }

    /// Child scope within an event.
    pub fn child(event_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self::Child {
            event_id: EventId::new(event_id),
            child_id: ChildId::new(child_id),
        }
    }

    /// Guest scope, optionally within an event.
    pub fn guest(guest_id: impl Into<String>, event_id: Option<&str>) -> Self {
        Self::Guest {
            guest_id: GuestId::new(guest_id),
            event_id: event_id.map(EventId::from),
        }
    }

    /// Gift scope.
    pub fn gift(gift_id: impl Into<String>) -> Self {
        Self::Gift {
            gift_id: GiftId::new(gift_id),
        }
    }

    /// Tier this scope belongs to.
    pub fn tier(&self) -> Tier {
        match self {
            Self::Event { .. } => Tier::Event,
            Self::Child { .. } => Tier::Child,
            Self::Guest { .. } => Tier::Guest,
            Self::Gift { .. } => Tier::Gift,
        }
    }

    /// Exclusivity bucket.
    pub fn bucket(&self) -> BucketKey {
        match self {
            Self::Event { event_id } => BucketKey::EventChild(event_id.clone(), None),
            Self::Child { event_id, child_id } => {
                BucketKey::EventChild(event_id.clone(), Some(child_id.clone()))
            }
            Self::Guest { guest_id, event_id } => {
                BucketKey::Guest(guest_id.clone(), event_id.clone())
            }
            Self::Gift { gift_id } => BucketKey::Gift(gift_id.clone()),
        }
    }

    /// Persisted column form.
    pub fn fields(&self) -> ScopeFields {
        match self.clone() {
            Self::Event { event_id } => ScopeFields {
                event_id: Some(event_id),
                ..ScopeFields::default()
            },
            Self::Child { event_id, child_id } => ScopeFields {
                event_id: Some(event_id),
                child_id: Some(child_id),
                ..ScopeFields::default()
            },
            Self::Guest { guest_id, event_id } => ScopeFields {
                event_id,
                guest_id: Some(guest_id),
                ..ScopeFields::default()
            },
            Self::Gift { gift_id } => ScopeFields {
                gift_id: Some(gift_id),
                ..ScopeFields::default()
            },
        }
    }

    /// Rebuild a scope from columns, rejecting meaningless combinations.
    pub fn from_fields(f: &ScopeFields) -> FrameResult<Self> {
        match (&f.event_id, &f.child_id, &f.guest_id, &f.gift_id) {
            (None, None, None, Some(gift_id)) => Ok(Self::Gift {
                gift_id: gift_id.clone(),
            }),
            (event_id, None, Some(guest_id), None) => Ok(Self::Guest {
                guest_id: guest_id.clone(),
                event_id: event_id.clone(),
            }),
            (Some(event_id), Some(child_id), None, None) => Ok(Self::Child {
                event_id: event_id.clone(),
                child_id: child_id.clone(),
            }),
            (Some(event_id), None, None, None) => Ok(Self::Event {
                event_id: event_id.clone(),
            }),
            (None, Some(_), _, _) => Err(FrameError::validation(
                "child scope requires an event id",
            )),
            (None, None, None, None) => Err(FrameError::validation(
                "assignment scope must name at least one id",
            )),
            _ => Err(FrameError::validation(
                "assignment scope combines ids from more than one tier",
            )),
        }
    }

    /// Reject blank ids.
    pub fn validate(&self) -> FrameResult<()> {
        let f = self.fields();
        let ids = [
            f.event_id.as_ref().map(EventId::as_str),
            f.child_id.as_ref().map(ChildId::as_str),
            f.guest_id.as_ref().map(GuestId::as_str),
            f.gift_id.as_ref().map(GiftId::as_str),
        ];
        if ids.into_iter().flatten().any(|s| s.trim().is_empty()) {
            return Err(FrameError::validation("scope ids must be non-empty"));
        }
        Ok(())
    }
}

/// Binding of a template to a scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameAssignment {
    /// Identifier.
    pub id: AssignmentId,
    /// Linked template.
    pub template_id: TemplateId,
    /// Scope columns.
    #[serde(flatten)]
    pub scope: ScopeFields,
    /// Derived from the tier.
    pub priority: u8,
    /// Cleared on supersession.
    pub is_active: bool,
    /// Creation instant; recency tie-break.
    pub created_at: DateTime<Utc>,
}

impl FrameAssignment {
    /// New active assignment for `scope`.
    pub fn new(template_id: TemplateId, scope: &AssignmentScope, created_at: DateTime<Utc>) -> Self {
        Self {
            id: AssignmentId::generate(),
            template_id,
            scope: scope.fields(),
            priority: scope.tier().priority(),
            is_active: true,
            created_at,
        }
    }

    /// Typed scope.
    pub fn typed_scope(&self) -> FrameResult<AssignmentScope> {
        AssignmentScope::from_fields(&self.scope)
    }

    /// Whether this assignment governs recordings described by `ctx`.
    ///
    /// The tier-defining id must equal the context's id for that tier; any other id carried by
    /// both sides must agree.
    pub fn applies_to(&self, ctx: &ResolutionContext) -> bool {
        fn eq<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
            matches!((a, b), (Some(x), Some(y)) if x == y)
        }
        fn agree<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
            match (a, b) {
                (Some(x), Some(y)) => x == y,
                _ => true,
            }
        }

        let s = &self.scope;
        let Ok(scope) = self.typed_scope() else {
            return false;
        };
        let key_match = match scope.tier() {
            Tier::Gift => eq(&s.gift_id, &ctx.gift_id),
            Tier::Guest => eq(&s.guest_id, &ctx.guest_id),
            Tier::Child => eq(&s.child_id, &ctx.child_id),
            Tier::Event => eq(&s.event_id, &ctx.event_id),
        };
        key_match
            && agree(&s.event_id, &ctx.event_id)
            && agree(&s.child_id, &ctx.child_id)
            && agree(&s.guest_id, &ctx.guest_id)
            && agree(&s.gift_id, &ctx.gift_id)
    }
}

/// Who is recording what, for whom. Transient lookup key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionContext {
    /// Event.
    #[serde(default)]
    pub event_id: Option<EventId>,
    /// Child.
    #[serde(default)]
    pub child_id: Option<ChildId>,
    /// Guest.
    #[serde(default)]
    pub guest_id: Option<GuestId>,
    /// Gift.
    #[serde(default)]
    pub gift_id: Option<GiftId>,
}

impl ResolutionContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event.
    pub fn event(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(EventId::new(id));
        self
    }

    /// Set the child.
    pub fn child(mut self, id: impl Into<String>) -> Self {
        self.child_id = Some(ChildId::new(id));
        self
    }

    /// Set the guest.
    pub fn guest(mut self, id: impl Into<String>) -> Self {
        self.guest_id = Some(GuestId::new(id));
        self
    }

    /// Set the gift.
    pub fn gift(mut self, id: impl Into<String>) -> Self {
        self.gift_id = Some(GiftId::new(id));
        self
    }

    /// No ids at all.
    pub fn is_empty(&self) -> bool {
        self.event_id.is_none()
            && self.child_id.is_none()
            && self.guest_id.is_none()
            && self.gift_id.is_none()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/assignment.rs"]
mod tests;
