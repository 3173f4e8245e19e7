//! Request-layer commands for the town context.

use plaza_core::command::Command;
use plaza_core::geometry::BoundingBox;
use uuid::Uuid;

/// Command to create a new town.
#[derive(Debug, Clone)]
pub struct CreateTown {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display name of the town.
    pub friendly_name: String,
    /// Whether the town appears in the public listing.
    pub is_publicly_listed: bool,
}

impl Command for CreateTown {
    fn command_type(&self) -> &'static str {
        "town.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to rename a town or change its visibility.
#[derive(Debug, Clone)]
pub struct UpdateTown {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The town to update.
    pub town_id: String,
    /// The town's update password.
    pub update_password: String,
    /// New display name, if changing.
    pub friendly_name: Option<String>,
    /// New visibility, if changing.
    pub is_publicly_listed: Option<bool>,
}

impl Command for UpdateTown {
    fn command_type(&self) -> &'static str {
        "town.update"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to close and remove a town.
#[derive(Debug, Clone)]
pub struct DeleteTown {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The town to delete.
    pub town_id: String,
    /// The town's update password.
    pub update_password: String,
}

impl Command for DeleteTown {
    fn command_type(&self) -> &'static str {
        "town.delete"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to admit a new participant into a town.
#[derive(Debug, Clone)]
pub struct JoinTown {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The town to join.
    pub town_id: String,
    /// Display name of the new participant.
    pub display_name: String,
}

impl Command for JoinTown {
    fn command_type(&self) -> &'static str {
        "town.join"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to create a designated zone.
#[derive(Debug, Clone)]
pub struct CreateZone {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The town the zone belongs to.
    pub town_id: String,
    /// Session token of the requesting participant.
    pub session_token: String,
    /// Unique zone label.
    pub label: String,
    /// Discussion topic.
    pub topic: String,
    /// Region covered by the zone.
    pub bounding_box: BoundingBox,
}

impl Command for CreateZone {
    fn command_type(&self) -> &'static str {
        "town.create_zone"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to post a message to an ad-hoc group.
#[derive(Debug, Clone)]
pub struct SendMessage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The town the group lives in.
    pub town_id: String,
    /// Session token of the author.
    pub session_token: String,
    /// Target group.
    pub group_id: Uuid,
    /// Message text.
    pub body: String,
    /// Recipient, when the message is private.
    pub private_recipient_id: Option<Uuid>,
}

impl Command for SendMessage {
    fn command_type(&self) -> &'static str {
        "town.send_message"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
