use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use depot_events::Event;

/// Supplier identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(pub AggregateId);

impl SupplierId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Contact information for a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Aggregate root: Supplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supplier {
    id: SupplierId,
    name: String,
    contact: ContactInfo,
    version: u64,
    created: bool,
}

impl Supplier {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SupplierId) -> Self {
        Self {
            id,
            name: String::new(),
            contact: ContactInfo::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SupplierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn exists(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterSupplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSupplier {
    pub supplier_id: SupplierId,
    pub name: String,
    pub contact: Option<ContactInfo>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateSupplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSupplier {
    pub supplier_id: SupplierId,
    /// Optional new name (if None, keep existing).
    pub name: Option<String>,
    /// Optional new contact info (if None, keep existing).
    pub contact: Option<ContactInfo>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierCommand {
    RegisterSupplier(RegisterSupplier),
    UpdateSupplier(UpdateSupplier),
}

/// Event: SupplierRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRegistered {
    pub supplier_id: SupplierId,
    pub name: String,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SupplierUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierUpdated {
    pub supplier_id: SupplierId,
    pub name: Option<String>,
    pub contact: Option<ContactInfo>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierEvent {
    SupplierRegistered(SupplierRegistered),
    SupplierUpdated(SupplierUpdated),
}

impl Event for SupplierEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SupplierEvent::SupplierRegistered(_) => "directory.supplier.registered",
            SupplierEvent::SupplierUpdated(_) => "directory.supplier.updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SupplierEvent::SupplierRegistered(e) => e.occurred_at,
            SupplierEvent::SupplierUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Supplier {
    type Command = SupplierCommand;
    type Event = SupplierEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SupplierEvent::SupplierRegistered(e) => {
                self.id = e.supplier_id;
                self.name = e.name.clone();
                self.contact = e.contact.clone();
                self.created = true;
            }
            SupplierEvent::SupplierUpdated(e) => {
                if let Some(name) = &e.name {
                    self.name = name.clone();
                }
                if let Some(contact) = &e.contact {
                    self.contact = contact.clone();
                }
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SupplierCommand::RegisterSupplier(cmd) => self.handle_register(cmd),
            SupplierCommand::UpdateSupplier(cmd) => self.handle_update(cmd),
        }
    }
}

impl Supplier {
    fn ensure_supplier_id(&self, supplier_id: SupplierId) -> Result<(), DomainError> {
        if self.id != supplier_id {
            return Err(DomainError::conflict("supplier_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterSupplier) -> Result<Vec<SupplierEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("supplier already registered"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("supplier name cannot be empty"));
        }

        Ok(vec![SupplierEvent::SupplierRegistered(SupplierRegistered {
            supplier_id: cmd.supplier_id,
            name: cmd.name.clone(),
            contact: cmd.contact.clone().unwrap_or_default(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateSupplier) -> Result<Vec<SupplierEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::validation("supplier is not registered"));
        }
        self.ensure_supplier_id(cmd.supplier_id)?;

        if let Some(name) = &cmd.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("supplier name cannot be empty"));
            }
        }
        if cmd.name.is_none() && cmd.contact.is_none() {
            return Err(DomainError::validation("nothing to update"));
        }

        Ok(vec![SupplierEvent::SupplierUpdated(SupplierUpdated {
            supplier_id: cmd.supplier_id,
            name: cmd.name.clone(),
            contact: cmd.contact.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::AggregateId;

    fn test_supplier_id() -> SupplierId {
        SupplierId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn registered(id: SupplierId, name: &str) -> Supplier {
        let mut supplier = Supplier::empty(id);
        let events = supplier
            .handle(&SupplierCommand::RegisterSupplier(RegisterSupplier {
                supplier_id: id,
                name: name.to_string(),
                contact: None,
                occurred_at: test_time(),
            }))
            .unwrap();
        supplier.apply(&events[0]);
        supplier
    }

    #[test]
    fn register_supplier_emits_registered_event() {
        let id = test_supplier_id();
        let supplier = Supplier::empty(id);

        let events = supplier
            .handle(&SupplierCommand::RegisterSupplier(RegisterSupplier {
                supplier_id: id,
                name: "Droguería Central".to_string(),
                contact: Some(ContactInfo {
                    contact_name: Some("Laura M.".to_string()),
                    email: None,
                    phone: Some("555-0199".to_string()),
                }),
                occurred_at: test_time(),
            }))
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            SupplierEvent::SupplierRegistered(e) => {
                assert_eq!(e.supplier_id, id);
                assert_eq!(e.name, "Droguería Central");
                assert_eq!(e.contact.phone.as_deref(), Some("555-0199"));
            }
            _ => panic!("Expected SupplierRegistered event"),
        }
    }

    #[test]
    fn register_supplier_rejects_blank_name() {
        let id = test_supplier_id();
        let supplier = Supplier::empty(id);

        let err = supplier
            .handle(&SupplierCommand::RegisterSupplier(RegisterSupplier {
                supplier_id: id,
                name: "   ".to_string(),
                contact: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_supplier_rejects_duplicate_registration() {
        let id = test_supplier_id();
        let supplier = registered(id, "Droguería Central");

        let err = supplier
            .handle(&SupplierCommand::RegisterSupplier(RegisterSupplier {
                supplier_id: id,
                name: "Droguería Central".to_string(),
                contact: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            other => panic!("Expected Conflict error, got {other:?}"),
        }
    }

    #[test]
    fn update_supplier_replaces_name_and_contact() {
        let id = test_supplier_id();
        let mut supplier = registered(id, "Droguería Central");

        let events = supplier
            .handle(&SupplierCommand::UpdateSupplier(UpdateSupplier {
                supplier_id: id,
                name: Some("Droguería del Norte".to_string()),
                contact: Some(ContactInfo {
                    contact_name: None,
                    email: Some("ventas@norte.example".to_string()),
                    phone: None,
                }),
                occurred_at: test_time(),
            }))
            .unwrap();
        supplier.apply(&events[0]);

        assert_eq!(supplier.name(), "Droguería del Norte");
        assert_eq!(
            supplier.contact().email.as_deref(),
            Some("ventas@norte.example")
        );
        assert_eq!(supplier.version(), 2);
    }

    #[test]
    fn update_supplier_rejects_unregistered_supplier() {
        let id = test_supplier_id();
        let supplier = Supplier::empty(id);

        let err = supplier
            .handle(&SupplierCommand::UpdateSupplier(UpdateSupplier {
                supplier_id: id,
                name: Some("Anything".to_string()),
                contact: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_supplier_rejects_empty_update() {
        let id = test_supplier_id();
        let supplier = registered(id, "Droguería Central");

        let err = supplier
            .handle(&SupplierCommand::UpdateSupplier(UpdateSupplier {
                supplier_id: id,
                name: None,
                contact: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let id = test_supplier_id();
        let supplier = registered(id, "Droguería Central");
        let before = supplier.clone();

        let cmd = SupplierCommand::UpdateSupplier(UpdateSupplier {
            supplier_id: id,
            name: Some("Renamed".to_string()),
            contact: None,
            occurred_at: test_time(),
        });

        let events1 = supplier.handle(&cmd).unwrap();
        let events2 = supplier.handle(&cmd).unwrap();

        assert_eq!(supplier, before);
        assert_eq!(events1, events2);
    }
}
