//! Business entity service
//!
//! Creates, renames, reorders and deletes business entities, and resolves
//! user-typed context names.

use crate::audit::{AuditEntry, EntityType};
use crate::error::{ContasError, ContasResult};
use crate::models::business::normalize_name;
use crate::models::{BusinessEntity, BusinessId, Context, UserId};
use crate::storage::{LedgerReader, LedgerWriter};

use super::unit_of_work::record_audit;

/// Resolve a user-typed context
///
/// Empty text and "personal" map to Personal. Anything else must name one of
/// the user's businesses (case-insensitive) or match its id.
pub fn resolve_context<R: LedgerReader + ?Sized>(
    reader: &R,
    user_id: UserId,
    text: &str,
) -> ContasResult<Context> {
    let text = text.trim();
    if text.is_empty() || is_reserved(text) {
        return Ok(Context::Personal);
    }

    let businesses = reader.list_businesses(user_id)?;
    let lowered = text.to_lowercase();

    businesses
        .iter()
        .find(|b| b.name.to_lowercase() == lowered)
        .or_else(|| businesses.iter().find(|b| b.id.matches(text)))
        .map(BusinessEntity::context)
        .ok_or_else(|| ContasError::business_not_found(text))
}

fn is_reserved(name: &str) -> bool {
    name.eq_ignore_ascii_case("personal") || name.eq_ignore_ascii_case("pessoal")
}

fn check_not_reserved(name: &str) -> ContasResult<()> {
    if is_reserved(name) {
        return Err(ContasError::Validation(
            "\"Personal\" is reserved for the personal context".into(),
        ));
    }
    Ok(())
}

/// Service for business entity management
pub struct BusinessService<'a, S: LedgerReader + LedgerWriter> {
    ledger: &'a S,
}

impl<'a, S: LedgerReader + LedgerWriter> BusinessService<'a, S> {
    pub fn new(ledger: &'a S) -> Self {
        Self { ledger }
    }

    /// Create a business; the name is trimmed and cut to 100 characters
    pub fn create(
        &self,
        user_id: UserId,
        name: &str,
        order: Option<i32>,
    ) -> ContasResult<BusinessEntity> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(ContasError::Validation("Business name cannot be empty".into()));
        }
        check_not_reserved(&name)?;
        if self.ledger.find_business_by_name(user_id, &name)?.is_some() {
            return Err(ContasError::Validation(format!(
                "A business named '{}' already exists",
                name
            )));
        }

        let order = match order {
            Some(order) => order,
            None => self
                .ledger
                .list_businesses(user_id)?
                .iter()
                .map(|b| b.order + 1)
                .max()
                .unwrap_or(0),
        };

        let business = BusinessEntity::new(user_id, &name, order);
        business.validate().map_err(ContasError::Validation)?;

        self.ledger.save_business(business.clone())?;

        record_audit(
            self.ledger,
            &AuditEntry::create(
                EntityType::Business,
                business.id.to_string(),
                Some(business.name.clone()),
                &business,
            ),
        );

        Ok(business)
    }

    /// Rename and/or reorder a business
    pub fn update(
        &self,
        user_id: UserId,
        id: BusinessId,
        name: Option<&str>,
        order: Option<i32>,
    ) -> ContasResult<BusinessEntity> {
        let before = self
            .ledger
            .get_business(user_id, id)?
            .ok_or_else(|| ContasError::business_not_found(id.to_string()))?;
        let mut after = before.clone();

        if let Some(name) = name {
            let name = normalize_name(name);
            check_not_reserved(&name)?;
            if let Some(existing) = self.ledger.find_business_by_name(user_id, &name)? {
                if existing.id != id {
                    return Err(ContasError::Validation(format!(
                        "A business named '{}' already exists",
                        name
                    )));
                }
            }
            after.rename(&name);
        }
        if let Some(order) = order {
            after.order = order;
        }

        after.validate().map_err(ContasError::Validation)?;

        self.ledger.save_business(after.clone())?;

        record_audit(
            self.ledger,
            &AuditEntry::update(
                EntityType::Business,
                after.id.to_string(),
                Some(after.name.clone()),
                &before,
                &after,
            ),
        );

        Ok(after)
    }

    /// Delete a business; its movements, cards and charges keep their tag
    pub fn delete(&self, user_id: UserId, id: BusinessId) -> ContasResult<BusinessEntity> {
        let business = self
            .ledger
            .get_business(user_id, id)?
            .ok_or_else(|| ContasError::business_not_found(id.to_string()))?;

        self.ledger.delete_business(id)?;

        record_audit(
            self.ledger,
            &AuditEntry::delete(
                EntityType::Business,
                business.id.to_string(),
                Some(business.name.clone()),
                &business,
            ),
        );

        Ok(business)
    }

    /// All businesses of the user, ordered by (order, name)
    pub fn list(&self, user_id: UserId) -> ContasResult<Vec<BusinessEntity>> {
        self.ledger.list_businesses(user_id)
    }

    /// Find a business by name or id
    pub fn find(&self, user_id: UserId, identifier: &str) -> ContasResult<Option<BusinessEntity>> {
        if let Some(business) = self.ledger.find_business_by_name(user_id, identifier)? {
            return Ok(Some(business));
        }
        Ok(self
            .list(user_id)?
            .into_iter()
            .find(|b| b.id.matches(identifier)))
    }

    pub fn resolve_context(&self, user_id: UserId, text: &str) -> ContasResult<Context> {
        resolve_context(self.ledger, user_id, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ContasPaths;
    use crate::storage::Storage;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_assigns_next_order() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = BusinessService::new(&storage);

        let arcade = service.create(user, " Arcade ", None).unwrap();
        let bakery = service.create(user, "Bakery", None).unwrap();

        assert_eq!(arcade.name, "Arcade");
        assert_eq!(arcade.order, 0);
        assert_eq!(bakery.order, 1);
    }

    #[test]
    fn test_create_rejects_empty_duplicate_and_reserved() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = BusinessService::new(&storage);

        service.create(user, "Arcade", None).unwrap();
        assert!(service.create(user, "   ", None).unwrap_err().is_validation());
        assert!(service.create(user, "ARCADE", None).unwrap_err().is_validation());
        assert!(service.create(user, "Personal", None).unwrap_err().is_validation());
    }

    #[test]
    fn test_rename_and_reorder() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = BusinessService::new(&storage);

        let arcade = service.create(user, "Arcade", None).unwrap();
        service.create(user, "Bakery", None).unwrap();

        service
            .update(user, arcade.id, Some("Zebra Games"), Some(5))
            .unwrap();

        let names: Vec<_> = service.list(user).unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Bakery", "Zebra Games"]);
    }

    #[test]
    fn test_resolve_context() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = BusinessService::new(&storage);
        let arcade = service.create(user, "Arcade", None).unwrap();

        assert_eq!(service.resolve_context(user, "").unwrap(), Context::Personal);
        assert_eq!(service.resolve_context(user, "Personal").unwrap(), Context::Personal);
        assert_eq!(service.resolve_context(user, "arcade").unwrap(), arcade.context());
        assert_eq!(
            service
                .resolve_context(user, &arcade.id.to_string())
                .unwrap(),
            arcade.context()
        );
        assert!(service.resolve_context(user, "Bakery").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = BusinessService::new(&storage);
        let arcade = service.create(user, "Arcade", None).unwrap();

        service.delete(user, arcade.id).unwrap();
        assert!(service.list(user).unwrap().is_empty());
        assert!(service.delete(user, arcade.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unwritable_audit_log_does_not_fail_saved_writes() {
        let (temp_dir, storage) = create_test_storage();
        let user = UserId::new();
        std::fs::create_dir_all(storage.paths().audit_log()).unwrap();
        let service = BusinessService::new(&storage);

        let arcade = service.create(user, "Arcade", None).unwrap();
        service
            .update(user, arcade.id, Some("Arcade Prime"), None)
            .unwrap();
        let bakery = service.create(user, "Bakery", None).unwrap();
        service.delete(user, bakery.id).unwrap();

        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut reloaded = Storage::new(paths).unwrap();
        reloaded.load_all().unwrap();
        let names: Vec<_> = reloaded
            .list_businesses(user)
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Arcade Prime"]);
    }
}
