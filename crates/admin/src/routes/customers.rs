//! Customer screens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use climatech_core::CustomerId;
use climatech_core::records::{Customer, Order};
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{
    DataTableConfig, SortDir, TableColumn, TableFilter, TableQuery, TableRow, TableState,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::{AdminPage, finish};
use crate::state::AppState;

impl TableRow for Customer {
    fn cell(&self, key: &str) -> String {
        match key {
            "name" => self.name.clone(),
            "email" => self.email.clone(),
            "phone" => self.phone.clone().unwrap_or_default(),
            "city" => self.city.clone().unwrap_or_default(),
            "orders" => self.orders_count.to_string(),
            "status" => if self.is_active { "active" } else { "inactive" }.to_string(),
            _ => String::new(),
        }
    }

    fn search_text(&self, key: &str) -> String {
        match key {
            "status" => if self.is_active { "Activo" } else { "Bloqueado" }.to_string(),
            other => self.cell(other),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig::new("/customers")
        .column(TableColumn::sortable("name", "Nombre"))
        .column(TableColumn::sortable("email", "Correo"))
        .column(TableColumn::new("phone", "Teléfono"))
        .column(TableColumn::sortable("city", "Ciudad"))
        .column(TableColumn::sortable("orders", "Pedidos"))
        .column(TableColumn::sortable("status", "Estado"))
        .filter(TableFilter {
            key: "status",
            label: "Estado",
            options: vec![
                ("active".into(), "Activos".into()),
                ("inactive".into(), "Bloqueados".into()),
            ],
        })
        .search_placeholder("Buscar por nombre, correo o ciudad...")
        .empty_state("No hay clientes registrados")
        .default_sort("name", SortDir::Asc)
}

#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub page: AdminPage,
    pub table: TableState<Customer>,
}

#[instrument(skip(admin, state, session, query))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TableQuery>,
) -> Result<CustomersIndexTemplate> {
    let customers = state.api().as_user(&admin.backend).list_customers().await?;
    Ok(CustomersIndexTemplate {
        page: AdminPage::new(&admin, "/customers", &session).await,
        table: TableState::build(customers, &table_config(), &query),
    })
}

/// Orders placed with the customer's email, newest first.
#[must_use]
pub fn orders_of(customer: &Customer, orders: Vec<Order>) -> Vec<Order> {
    let mut mine: Vec<Order> = orders
        .into_iter()
        .filter(|o| o.customer.email.as_str().eq_ignore_ascii_case(customer.email.trim()))
        .collect();
    mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    mine
}

#[derive(Template, WebTemplate)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub page: AdminPage,
    pub customer: Customer,
    pub orders: Vec<Order>,
}

/// Customer detail with their order history.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<CustomerShowTemplate> {
    let api = state.api().as_user(&admin.backend);
    let (customer, orders) = tokio::join!(api.get_customer(CustomerId::new(id)), api.list_orders());
    let customer = customer?;
    let orders = orders?;

    Ok(CustomerShowTemplate {
        page: AdminPage::new(&admin, "/customers", &session).await,
        orders: orders_of(&customer, orders),
        customer,
    })
}

/// Block or unblock a customer account.
#[instrument(skip(admin, state, session))]
pub async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    let api = state.api().as_user(&admin.backend);
    let id = CustomerId::new(id);
    let customer = api.get_customer(id).await?;

    let outcome = api
        .set_customer_active(id, !customer.is_active)
        .await
        .map(|updated| {
            if updated.is_active {
                format!("{} desbloqueado", updated.name)
            } else {
                format!("{} bloqueado", updated.name)
            }
        });
    finish(&session, &format!("/customers/{id}"), outcome).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order(id: i64, email: &str, created: &str) -> Order {
        serde_json::from_value(json!({
            "id": id, "reference": format!("CT-{id}"), "status": "paid", "total": 100,
            "items": [], "createdAt": created,
            "customer": {"name": "Luis", "email": email, "phone": "300", "address": "Cra 1", "city": "Cali"}
        }))
        .unwrap()
    }

    #[test]
    fn test_orders_of_matches_email_newest_first() {
        let customer: Customer = serde_json::from_value(json!({
            "id": 4, "name": "Luis", "email": "Luis@Mail.co"
        }))
        .unwrap();
        let orders = vec![
            order(1, "luis@mail.co", "2026-01-02T10:00:00Z"),
            order(2, "otra@mail.co", "2026-01-03T10:00:00Z"),
            order(3, "luis@mail.co", "2026-02-01T10:00:00Z"),
        ];
        let mine: Vec<i64> = orders_of(&customer, orders).iter().map(|o| o.id.as_i64()).collect();
        assert_eq!(mine, vec![3, 1]);
    }

    #[test]
    fn test_customer_cells() {
        let customer: Customer = serde_json::from_value(json!({
            "id": 4, "name": "Luis", "email": "l@mail.co", "isActive": false, "ordersCount": 3
        }))
        .unwrap();
        assert_eq!(customer.cell("status"), "inactive");
        assert_eq!(customer.cell("orders"), "3");
        assert_eq!(customer.cell("city"), "");
    }

    #[test]
    fn test_search_matches_blocked_label_and_order_count() {
        let customers: Vec<Customer> = serde_json::from_value(json!([
            {"id": 1, "name": "Luis", "email": "l@mail.co", "isActive": false, "ordersCount": 3},
            {"id": 2, "name": "Ana", "email": "a@mail.co", "isActive": true, "ordersCount": 12}
        ]))
        .unwrap();
        let search = |q: &str| {
            let query = TableQuery {
                q: Some(q.into()),
                ..TableQuery::default()
            };
            TableState::build(customers.clone(), &table_config(), &query)
                .rows
                .iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(search("bloqueado"), vec!["Luis"]);
        assert_eq!(search("12"), vec!["Ana"]);
    }
}

