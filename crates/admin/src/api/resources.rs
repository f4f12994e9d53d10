//! Back-office operations on backend records.

use climatech_core::records::{
    ActiveUpdate, Appointment, AppointmentUpdate, Customer, NewProductOption, NewUser, Order,
    OrderStatusUpdate, ProductOption, StoreSettings, Technician, TechnicianInput, User,
    UserRoleUpdate,
};
use climatech_core::{
    AppointmentId, Content, ContentId, ContentInput, ContentType, CustomerId, OptionId, OrderId,
    OrderStatus, TechnicianId, UserId, UserRole,
};
use serde::Deserialize;
use tracing::instrument;

use super::{ApiError, AuthorizedApi, decode};

/// `/api/upload` answer.
#[derive(Debug, Deserialize)]
struct Uploaded {
    url: String,
}

fn content_path(content_type: ContentType) -> String {
    format!("/api/content/{}", content_type.as_str())
}

fn item_path(content_type: ContentType, id: ContentId) -> String {
    format!("/api/content/{}/{id}", content_type.as_str())
}

impl AuthorizedApi<'_> {
    // =========================================================================
    // Content
    // =========================================================================

    /// Every record of a content type, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(content_type = %content_type))]
    pub async fn list_content(&self, content_type: ContentType) -> Result<Vec<Content>, ApiError> {
        self.get(&content_path(content_type)).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the record does not exist.
    #[instrument(skip(self), fields(content_type = %content_type, id = %id))]
    pub async fn get_content(
        &self,
        content_type: ContentType,
        id: ContentId,
    ) -> Result<Content, ApiError> {
        self.get(&item_path(content_type, id)).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend rejects the input.
    #[instrument(skip(self, input), fields(content_type = %content_type))]
    pub async fn create_content(
        &self,
        content_type: ContentType,
        input: &ContentInput,
    ) -> Result<Content, ApiError> {
        self.post(&content_path(content_type), input).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend rejects the input.
    #[instrument(skip(self, input), fields(content_type = %content_type, id = %id))]
    pub async fn update_content(
        &self,
        content_type: ContentType,
        id: ContentId,
        input: &ContentInput,
    ) -> Result<Content, ApiError> {
        self.put(&item_path(content_type, id), input).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(content_type = %content_type, id = %id))]
    pub async fn delete_content(
        &self,
        content_type: ContentType,
        id: ContentId,
    ) -> Result<(), ApiError> {
        self.delete(&item_path(content_type, id)).await
    }

    /// Write `item` back with a new active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn set_content_active(&self, item: &Content, active: bool) -> Result<Content, ApiError> {
        let input = ContentInput {
            is_active: active,
            ..ContentInput::from(item)
        };
        self.update_content(item.content_type, item.id, &input).await
    }

    /// Write `item` back at a new position.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn set_order(&self, item: &Content, order: i32) -> Result<Content, ApiError> {
        let input = ContentInput {
            order,
            ..ContentInput::from(item)
        };
        self.update_content(item.content_type, item.id, &input).await
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.get("/api/admin/customers").await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the customer does not exist.
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, ApiError> {
        self.get(&format!("/api/admin/customers/{id}")).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn set_customer_active(&self, id: CustomerId, active: bool) -> Result<Customer, ApiError> {
        self.put(
            &format!("/api/admin/customers/{id}"),
            &ActiveUpdate { is_active: active },
        )
        .await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` unless the caller is an administrator.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/api/admin/users").await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend rejects the user (e.g. the
    /// email is taken).
    #[instrument(skip(self, user), fields(email = %user.email, role = %user.role))]
    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post("/api/admin/users", user).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn update_user_role(&self, id: UserId, role: UserRole) -> Result<User, ApiError> {
        self.put(&format!("/api/admin/users/{id}"), &UserRoleUpdate { role })
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        self.delete(&format!("/api/admin/users/{id}")).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get("/api/orders").await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.get(&format!("/api/orders/{id}")).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, ApiError> {
        self.put(&format!("/api/orders/{id}"), &OrderStatusUpdate { status })
            .await
    }

    // =========================================================================
    // Appointments and technicians
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.get("/api/appointments").await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, update))]
    pub async fn update_appointment(
        &self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, ApiError> {
        self.put(&format!("/api/appointments/{id}"), update).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_technicians(&self) -> Result<Vec<Technician>, ApiError> {
        self.get("/api/technicians").await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend rejects the input.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_technician(&self, input: &TechnicianInput) -> Result<Technician, ApiError> {
        self.post("/api/technicians", input).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend rejects the input.
    #[instrument(skip(self, input))]
    pub async fn update_technician(
        &self,
        id: TechnicianId,
        input: &TechnicianInput,
    ) -> Result<Technician, ApiError> {
        self.put(&format!("/api/technicians/{id}"), input).await
    }

    /// Write `technician` back with a new active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn set_technician_active(
        &self,
        technician: &Technician,
        active: bool,
    ) -> Result<Technician, ApiError> {
        let input = TechnicianInput {
            name: technician.name.clone(),
            phone: technician.phone.clone(),
            email: technician.email.clone(),
            specialty: technician.specialty.clone(),
            is_active: active,
        };
        self.update_technician(technician.id, &input).await
    }

    // =========================================================================
    // Catalog taxonomy and settings
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_product_options(&self) -> Result<Vec<ProductOption>, ApiError> {
        self.get("/api/product-options").await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Status` if the value already exists.
    #[instrument(skip(self, option), fields(kind = option.kind.as_str()))]
    pub async fn create_product_option(
        &self,
        option: &NewProductOption,
    ) -> Result<ProductOption, ApiError> {
        self.post("/api/product-options", option).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete_product_option(&self, id: OptionId) -> Result<(), ApiError> {
        self.delete(&format!("/api/product-options/{id}")).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn store_settings(&self) -> Result<StoreSettings, ApiError> {
        self.get("/api/admin/store-settings").await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend rejects the settings.
    #[instrument(skip(self, settings))]
    pub async fn update_store_settings(
        &self,
        settings: &StoreSettings,
    ) -> Result<StoreSettings, ApiError> {
        self.put("/api/admin/store-settings", settings).await
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Forward an image to the backend and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend rejects the file.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .request(reqwest::Method::POST, "/api/upload")
            .multipart(form)
            .send()
            .await?;
        let uploaded: Uploaded = decode(response, "upload").await?;
        Ok(uploaded.url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::extract::{Multipart, Path};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::super::ApiClient;
    use super::super::tests::{authorized, session, spawn};
    use super::*;

    #[tokio::test]
    async fn test_calls_forward_session_cookie() {
        let router = Router::new().route(
            "/api/admin/customers",
            get(|headers: HeaderMap| async move {
                if authorized(&headers) {
                    Json(json!([{"id": 1, "name": "Ana", "email": "ana@correo.co", "ordersCount": 3}]))
                        .into_response()
                } else {
                    StatusCode::UNAUTHORIZED.into_response()
                }
            }),
        );
        let client = ApiClient::new(&spawn(router).await);

        let customers = client.as_user(&session()).list_customers().await.unwrap();
        assert_eq!(customers[0].orders_count, 3);

        let stranger = super::super::BackendSession::new("sid=nope");
        assert!(matches!(
            client.as_user(&stranger).list_customers().await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_set_content_active_sends_full_record() {
        let router = Router::new().route(
            "/api/content/faq/{id}",
            put(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                let mut echoed = body.clone();
                echoed["id"] = json!(id);
                echoed["type"] = json!("faq");
                Json(echoed)
            }),
        );
        let client = ApiClient::new(&spawn(router).await);
        let faq: Content = serde_json::from_value(json!({
            "id": 5, "type": "faq", "title": "¿Instalan?", "description": "Sí", "order": 2, "isActive": true
        }))
        .unwrap();

        let updated = client
            .as_user(&session())
            .set_content_active(&faq, false)
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.title, "¿Instalan?");
        assert_eq!(updated.order, 2);
    }

    #[tokio::test]
    async fn test_update_order_status_body() {
        let router = Router::new().route(
            "/api/orders/{id}",
            put(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                Json(json!({
                    "id": id, "reference": "CT-9", "status": body["status"], "total": 0,
                    "items": [],
                    "customer": {
                        "name": "Ana", "email": "ana@correo.co", "phone": "3001234567",
                        "address": "Calle 1", "city": "Cali"
                    }
                }))
            }),
        );
        let client = ApiClient::new(&spawn(router).await);
        let order = client
            .as_user(&session())
            .update_order_status(OrderId::new(9), OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let router = Router::new().route(
            "/api/product-options/{id}",
            axum::routing::delete(|Path(id): Path<i64>| async move {
                if id == 4 {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::NOT_FOUND
                }
            }),
        );
        let client = ApiClient::new(&spawn(router).await);
        let api = session();
        let api = client.as_user(&api);

        api.delete_product_option(OptionId::new(4)).await.unwrap();
        assert!(matches!(
            api.delete_product_option(OptionId::new(5)).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_file() {
        let router = Router::new().route(
            "/api/upload",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                let name = field.name().unwrap().to_string();
                let file_name = field.file_name().unwrap().to_string();
                let bytes = field.bytes().await.unwrap();
                Json(json!({
                    "url": format!("https://cdn.climatech.co/{name}/{file_name}/{}", bytes.len())
                }))
            }),
        );
        let client = ApiClient::new(&spawn(router).await);
        let url = client
            .as_user(&session())
            .upload("split.png", "image/png", vec![0_u8; 16])
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.climatech.co/file/split.png/16");
    }
}
