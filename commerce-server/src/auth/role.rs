//! 角色与授权策略
//!
//! 角色是封闭枚举，所有操作的授权集中在 [`authorize`] 一处做穷尽匹配。

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

/// 调用方角色（由外部认证服务签发在 JWT 中）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Owner,
    Finance,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
            Role::Finance => "FINANCE",
            Role::Customer => "CUSTOMER",
        }
    }

    /// 员工角色（可查看所有订单/付款）
    pub fn is_staff(&self) -> bool {
        match self {
            Role::Admin | Role::Owner | Role::Finance => true,
            Role::Customer => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "OWNER" => Ok(Role::Owner),
            "FINANCE" => Ok(Role::Finance),
            "CUSTOMER" => Ok(Role::Customer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// 受保护的业务操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ManageCart,
    PlaceOrder,
    PlaceOrderForOthers,
    ViewOrder,
    ChangeOrderStatus,
    CancelOrder,
    SubmitPaymentProof,
    VerifyPayment,
    ViewPayment,
    ReadNotifications,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ManageCart => "cart:manage",
            Operation::PlaceOrder => "orders:create",
            Operation::PlaceOrderForOthers => "orders:create_for_others",
            Operation::ViewOrder => "orders:read",
            Operation::ChangeOrderStatus => "orders:update_status",
            Operation::CancelOrder => "orders:cancel",
            Operation::SubmitPaymentProof => "payments:submit_proof",
            Operation::VerifyPayment => "payments:verify",
            Operation::ViewPayment => "payments:read",
            Operation::ReadNotifications => "notifications:read",
        }
    }
}

/// 授权范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// 任意资源
    All,
    /// 仅限调用方自己的资源
    Own,
}

/// 角色 × 操作 授权表
///
/// 返回 `None` 表示拒绝。
pub fn scope_for(role: Role, op: Operation) -> Option<Scope> {
    use Operation::*;
    use Role::*;

    match (op, role) {
        (ManageCart, _) => Some(Scope::Own),
        (PlaceOrder, _) => Some(Scope::Own),

        (PlaceOrderForOthers, Admin | Owner) => Some(Scope::All),
        (PlaceOrderForOthers, Finance | Customer) => None,

        (ViewOrder, Admin | Owner | Finance) => Some(Scope::All),
        (ViewOrder, Customer) => Some(Scope::Own),

        (ChangeOrderStatus, Admin | Owner) => Some(Scope::All),
        (ChangeOrderStatus, Finance | Customer) => None,

        (CancelOrder, Admin | Owner) => Some(Scope::All),
        (CancelOrder, Customer) => Some(Scope::Own),
        (CancelOrder, Finance) => None,

        // 凭证只能由订单所属用户提交
        (SubmitPaymentProof, _) => Some(Scope::Own),

        (VerifyPayment, Finance) => Some(Scope::All),
        (VerifyPayment, Admin | Owner | Customer) => None,

        (ViewPayment, Admin | Owner | Finance) => Some(Scope::All),
        (ViewPayment, Customer) => Some(Scope::Own),

        (ReadNotifications, Admin | Owner | Finance) => Some(Scope::All),
        (ReadNotifications, Customer) => Some(Scope::Own),
    }
}

/// 授权检查，拒绝时返回 403
pub fn authorize(role: Role, op: Operation) -> Result<Scope, AppError> {
    scope_for(role, op).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::PermissionDenied,
            format!("Role {} may not perform {}", role, op.as_str()),
        )
        .with_detail("operation", op.as_str())
        .with_detail("role", role.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 4] = [Role::Admin, Role::Owner, Role::Finance, Role::Customer];

    #[test]
    fn test_only_finance_verifies_payments() {
        for role in ALL_ROLES {
            let allowed = scope_for(role, Operation::VerifyPayment).is_some();
            assert_eq!(allowed, role == Role::Finance, "role {role}");
        }
    }

    #[test]
    fn test_status_changes_are_admin_or_owner() {
        assert_eq!(
            scope_for(Role::Admin, Operation::ChangeOrderStatus),
            Some(Scope::All)
        );
        assert_eq!(
            scope_for(Role::Owner, Operation::ChangeOrderStatus),
            Some(Scope::All)
        );
        assert_eq!(scope_for(Role::Finance, Operation::ChangeOrderStatus), None);
        assert_eq!(scope_for(Role::Customer, Operation::ChangeOrderStatus), None);
    }

    #[test]
    fn test_customers_are_scoped_to_own_resources() {
        for op in [
            Operation::ManageCart,
            Operation::PlaceOrder,
            Operation::ViewOrder,
            Operation::CancelOrder,
            Operation::SubmitPaymentProof,
            Operation::ViewPayment,
            Operation::ReadNotifications,
        ] {
            assert_eq!(scope_for(Role::Customer, op), Some(Scope::Own), "{op:?}");
        }
    }

    #[test]
    fn test_staff_view_all_orders() {
        for role in [Role::Admin, Role::Owner, Role::Finance] {
            assert_eq!(scope_for(role, Operation::ViewOrder), Some(Scope::All));
            assert!(role.is_staff());
        }
        assert!(!Role::Customer.is_staff());
    }

    #[test]
    fn test_authorize_error_is_forbidden() {
        let err = authorize(Role::Customer, Operation::VerifyPayment).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("finance".parse::<Role>(), Ok(Role::Finance));
        assert_eq!("OWNER".parse::<Role>(), Ok(Role::Owner));
        assert!("cashier".parse::<Role>().is_err());
        let json = serde_json::to_string(&Role::Customer).unwrap();
        assert_eq!(json, "\"CUSTOMER\"");
    }
}
