use crate::{
    db::DatabaseAccess,
    entities::{bill, customer},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Customer service for an owner's customer book
#[derive(Clone)]
pub struct CustomerService {
    db: DatabaseAccess,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub company: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub company: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    pub notes: Option<String>,
}

impl CustomerService {
    pub fn new(db: DatabaseAccess) -> Self {
        Self { db }
    }

    /// Loads a customer only if it belongs to `owner_id`.
    pub async fn find_owned<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        customer_id: Uuid,
    ) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .filter(customer::Column::OwnerId.eq(owner_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))
    }

    pub async fn count_customers<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
    ) -> Result<u64, ServiceError> {
        Ok(customer::Entity::find()
            .filter(customer::Column::OwnerId.eq(owner_id))
            .count(conn)
            .await?)
    }

    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn create_customer(
        &self,
        owner_id: Uuid,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();

        let customer = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email),
            phone: Set(input.phone),
            company: Set(input.company),
            address: Set(input.address),
            city: Set(input.city),
            state: Set(input.state),
            postal_code: Set(input.postal_code),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.get_pool())
        .await?;

        info!("Customer created: {}", customer.id);
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
    ) -> Result<customer::Model, ServiceError> {
        Self::find_owned(self.db.get_pool(), owner_id, customer_id).await
    }

    /// Returns one page of customers plus the total number of matches.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        owner_id: Uuid,
        search: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let mut query = customer::Entity::find()
            .filter(customer::Column::OwnerId.eq(owner_id))
            .order_by_asc(customer::Column::Name);

        if let Some(search) = search.as_deref().map(str::trim) {
            if !search.is_empty() {
                query = query.filter(
                    Condition::any()
                        .add(customer::Column::Name.contains(search))
                        .add(customer::Column::Email.contains(search))
                        .add(customer::Column::Phone.contains(search)),
                );
            }
        }

        let paginator = query.paginate(self.db.get_pool(), per_page);
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((customers, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_owned(self.db.get_pool(), owner_id, customer_id).await?;
        let mut customer: customer::ActiveModel = existing.into();

        if let Some(name) = input.name {
            customer.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            customer.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            customer.phone = Set(Some(phone));
        }
        if let Some(company) = input.company {
            customer.company = Set(Some(company));
        }
        if let Some(address) = input.address {
            customer.address = Set(Some(address));
        }
        if let Some(city) = input.city {
            customer.city = Set(Some(city));
        }
        if let Some(state) = input.state {
            customer.state = Set(Some(state));
        }
        if let Some(postal_code) = input.postal_code {
            customer.postal_code = Set(Some(postal_code));
        }
        if let Some(notes) = input.notes {
            customer.notes = Set(Some(notes));
        }
        customer.updated_at = Set(Utc::now());

        Ok(customer.update(self.db.get_pool()).await?)
    }

    /// Deletes a customer that has no bills.
    #[instrument(skip(self))]
    pub async fn delete_customer(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = self.db.get_pool();
        Self::find_owned(db, owner_id, customer_id).await?;

        let bills = bill::Entity::find()
            .filter(bill::Column::CustomerId.eq(customer_id))
            .count(db)
            .await?;
        if bills > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer {} still has {} bill(s)",
                customer_id, bills
            )));
        }

        customer::Entity::delete_many()
            .filter(customer::Column::Id.eq(customer_id))
            .filter(customer::Column::OwnerId.eq(owner_id))
            .exec(db)
            .await?;

        info!("Customer deleted: {}", customer_id);
        Ok(())
    }
}
