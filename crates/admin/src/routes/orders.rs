//! Order screens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use climatech_core::records::Order;
use climatech_core::{OrderId, OrderStatus, Price};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{
    DataTableConfig, SortDir, SortValue, TableColumn, TableFilter, TableQuery, TableRow,
    TableState,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::{AdminPage, finish, reject};
use crate::state::AppState;

impl TableRow for Order {
    fn cell(&self, key: &str) -> String {
        match key {
            "reference" => self.reference.clone(),
            "customer" => self.customer.name.clone(),
            "email" => self.customer.email.to_string(),
            "city" => self.customer.city.clone(),
            "total" => Price::cop(self.total).display(),
            "status" => self.status.as_str().to_string(),
            "date" => self
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn search_text(&self, key: &str) -> String {
        match key {
            "status" => self.status.label().to_string(),
            other => self.cell(other),
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "total" => SortValue::number(self.total),
            other => SortValue::text(&self.cell(other)),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig::new("/orders")
        .column(TableColumn::sortable("reference", "Referencia"))
        .column(TableColumn::sortable("customer", "Cliente"))
        .column(TableColumn::new("email", "Correo"))
        .column(TableColumn::sortable("city", "Ciudad"))
        .column(TableColumn::sortable("total", "Total"))
        .column(TableColumn::sortable("status", "Estado"))
        .column(TableColumn::sortable("date", "Fecha"))
        .filter(TableFilter {
            key: "status",
            label: "Estado",
            options: OrderStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), s.label().to_string()))
                .collect(),
        })
        .search_placeholder("Buscar por referencia, cliente o ciudad...")
        .empty_state("Todavía no hay pedidos")
        .default_sort("date", SortDir::Desc)
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: AdminPage,
    pub table: TableState<Order>,
}

#[instrument(skip(admin, state, session, query))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TableQuery>,
) -> Result<OrdersIndexTemplate> {
    let orders = state.api().as_user(&admin.backend).list_orders().await?;
    Ok(OrdersIndexTemplate {
        page: AdminPage::new(&admin, "/orders", &session).await,
        table: TableState::build(orders, &table_config(), &query),
    })
}

/// Status choice for the select box on the detail page.
#[derive(Debug, Clone)]
pub struct StatusChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Every status, the current one selected.
#[must_use]
pub fn status_choices(current: OrderStatus) -> Vec<StatusChoice> {
    OrderStatus::ALL
        .iter()
        .map(|s| StatusChoice {
            value: s.as_str(),
            label: s.label(),
            selected: *s == current,
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: AdminPage,
    pub order: Order,
    pub statuses: Vec<StatusChoice>,
}

#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<OrderShowTemplate> {
    let order = state
        .api()
        .as_user(&admin.backend)
        .get_order(OrderId::new(id))
        .await?;
    Ok(OrderShowTemplate {
        page: AdminPage::new(&admin, "/orders", &session).await,
        statuses: status_choices(order.status),
        order,
    })
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Move an order to another status.
#[instrument(skip(admin, state, session, form), fields(status = %form.status))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let id = OrderId::new(id);
    let back = format!("/orders/{id}");
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        return Ok(reject(&session, &back, "Estado no válido").await);
    };

    let outcome = state
        .api()
        .as_user(&admin.backend)
        .update_order_status(id, status)
        .await
        .map(|order| {
            tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
            format!("Pedido {} marcado como {}", order.reference, order.status.label())
        });
    finish(&session, &back, outcome).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order(id: i64, status: &str, total: i64, created: &str) -> Order {
        serde_json::from_value(json!({
            "id": id, "reference": format!("CT-{id}"), "status": status, "total": total,
            "createdAt": created,
            "customer": {"name": "Luis", "email": "luis@mail.co", "phone": "300", "address": "Cra 1", "city": "Cali"}
        }))
        .unwrap()
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let orders = vec![
            order(1, "paid", 900_000, "2026-03-01T09:00:00Z"),
            order(2, "pending", 1_200_000, "2026-03-04T09:00:00Z"),
        ];
        let state = TableState::build(orders, &table_config(), &TableQuery::default());
        assert_eq!(state.rows[0].id, OrderId::new(2));
    }

    #[test]
    fn test_total_sorts_by_amount_not_text() {
        let orders = vec![
            order(1, "paid", 10_000_000, "2026-03-01T09:00:00Z"),
            order(2, "paid", 950_000, "2026-03-02T09:00:00Z"),
        ];
        let query = TableQuery {
            sort: Some("total".into()),
            ..TableQuery::default()
        };
        let state = TableState::build(orders, &table_config(), &query);
        assert_eq!(state.rows[0].id, OrderId::new(2));
    }

    #[test]
    fn test_status_filter_uses_wire_value() {
        let orders = vec![
            order(1, "paid", 1, "2026-03-01T09:00:00Z"),
            order(2, "shipped", 1, "2026-03-02T09:00:00Z"),
        ];
        let query = TableQuery {
            filter: Some("shipped".into()),
            ..TableQuery::default()
        };
        let state = TableState::build(orders, &table_config(), &query);
        assert_eq!(state.total, 1);
    }

    #[test]
    fn test_search_matches_displayed_status_total_and_date() {
        let orders = || {
            vec![
                order(1, "paid", 1_250_000, "2026-03-01T09:00:00Z"),
                order(2, "shipped", 980_000, "2026-03-02T09:00:00Z"),
            ]
        };
        let search = |q: &str| {
            let query = TableQuery {
                q: Some(q.into()),
                ..TableQuery::default()
            };
            let state = TableState::build(orders(), &table_config(), &query);
            state.rows.iter().map(|o| o.id.as_i64()).collect::<Vec<_>>()
        };
        assert_eq!(search("enviado"), vec![2]);
        assert_eq!(search("$1.250.000"), vec![1]);
        assert_eq!(search("2026-03-02"), vec![2]);
        assert!(search("shipped").is_empty());
    }

    #[test]
    fn test_status_choices_select_current() {
        let choices = status_choices(OrderStatus::Shipped);
        let selected: Vec<&str> = choices.iter().filter(|c| c.selected).map(|c| c.value).collect();
        assert_eq!(selected, vec!["shipped"]);
    }
}
