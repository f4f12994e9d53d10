//! Status enums for records owned by the backend API.

use serde::{Deserialize, Serialize};

/// Generates `Display`/`FromStr`/`label()`/`ALL` for a snake_case status enum.
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($wire:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in workflow order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire value used by the backend API.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Human-readable label shown in templates.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(format!(concat!("invalid ", stringify!($name), ": {}"), other)),
                }
            }
        }
    };
}

status_enum! {
    /// Order lifecycle status as reported by the backend.
    OrderStatus {
        Pending => ("pending", "Pendiente"),
        Paid => ("paid", "Pagado"),
        Processing => ("processing", "En preparación"),
        Shipped => ("shipped", "Enviado"),
        Delivered => ("delivered", "Entregado"),
        Cancelled => ("cancelled", "Cancelado"),
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl OrderStatus {
    /// CSS badge class for the status.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "badge badge-warning",
            Self::Paid | Self::Processing => "badge badge-info",
            Self::Shipped | Self::Delivered => "badge badge-success",
            Self::Cancelled => "badge badge-muted",
        }
    }
}

status_enum! {
    /// Installation / maintenance appointment status.
    AppointmentStatus {
        Pending => ("pending", "Pendiente"),
        Confirmed => ("confirmed", "Confirmada"),
        InProgress => ("in_progress", "En curso"),
        Completed => ("completed", "Completada"),
        Cancelled => ("cancelled", "Cancelada"),
    }
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl AppointmentStatus {
    /// Whether the appointment still occupies a technician's schedule.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::InProgress)
    }
}

status_enum! {
    /// Back-office user role.
    UserRole {
        /// Full access including user management.
        Admin => ("admin", "Administrador"),
        /// Catalog, orders and scheduling, no user management.
        Manager => ("manager", "Gerente"),
        /// Read access to the schedule.
        Technician => ("technician", "Técnico"),
    }
}

/// Payment transaction status reported by Wompi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Declined,
    Voided,
    Error,
}

impl PaymentStatus {
    /// Whether the payment completed successfully.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Whether the status can still change.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pago pendiente",
            Self::Approved => "Pago aprobado",
            Self::Declined => "Pago rechazado",
            Self::Voided => "Pago anulado",
            Self::Error => "Error en el pago",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            "cancelled".parse::<OrderStatus>(),
            Ok(OrderStatus::Cancelled)
        );
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_appointment_status_in_progress_is_snake_case() {
        let parsed: AppointmentStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::InProgress);
        assert!(parsed.is_open());
        assert!(!AppointmentStatus::Completed.is_open());
    }

    #[test]
    fn test_user_role_all_and_labels() {
        assert_eq!(UserRole::ALL.len(), 3);
        assert_eq!(UserRole::Manager.to_string(), "manager");
        assert_eq!(UserRole::Technician.label(), "Técnico");
    }

    #[test]
    fn test_payment_status_screaming_case() {
        let parsed: PaymentStatus = serde_json::from_str("\"APPROVED\"").unwrap();
        assert!(parsed.is_approved());
        assert!(!PaymentStatus::Pending.is_final());
    }
}
