//! Payment destination types
//!
//! A payout destination is one of three shapes, each exported with its own
//! column layout. Modelling it as a tagged union keeps every exporter and
//! importer branch exhaustive.

use super::payout::BeneficiaryId;
use std::fmt;

/// Bank transfer destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankDestination {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    /// Sort code / routing number, when the bank requires one
    pub bank_code: Option<String>,
}

/// PayPal destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayPalDestination {
    pub email: String,
}

/// Mobile-money destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileMoneyDestination {
    pub phone: String,
    pub provider: String,
}

/// Effective payout destination snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethodSnapshot {
    Bank(BankDestination),
    PayPal(PayPalDestination),
    MobileMoney(MobileMoneyDestination),
}

impl PaymentMethodSnapshot {
    pub fn kind(&self) -> PaymentMethodKind {
        match self {
            PaymentMethodSnapshot::Bank(_) => PaymentMethodKind::Bank,
            PaymentMethodSnapshot::PayPal(_) => PaymentMethodKind::PayPal,
            PaymentMethodSnapshot::MobileMoney(_) => PaymentMethodKind::MobileMoney,
        }
    }
}

/// Discriminant of [`PaymentMethodSnapshot`], used to pick an export layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentMethodKind {
    Bank,
    PayPal,
    MobileMoney,
}

impl PaymentMethodKind {
    pub const ALL: [PaymentMethodKind; 3] = [
        PaymentMethodKind::Bank,
        PaymentMethodKind::PayPal,
        PaymentMethodKind::MobileMoney,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethodKind::Bank => "bank",
            PaymentMethodKind::PayPal => "paypal",
            PaymentMethodKind::MobileMoney => "mobile_money",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bank" => Some(PaymentMethodKind::Bank),
            "paypal" => Some(PaymentMethodKind::PayPal),
            "mobile_money" | "mobile" => Some(PaymentMethodKind::MobileMoney),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Beneficiary directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beneficiary {
    pub id: BeneficiaryId,
    pub name: String,
    pub email: String,
    /// Default payment method on file
    pub default_method: Option<PaymentMethodSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bank", Some(PaymentMethodKind::Bank))]
    #[case("PayPal", Some(PaymentMethodKind::PayPal))]
    #[case("mobile", Some(PaymentMethodKind::MobileMoney))]
    #[case("mobile_money", Some(PaymentMethodKind::MobileMoney))]
    #[case("cheque", None)]
    fn test_kind_parse(#[case] input: &str, #[case] expected: Option<PaymentMethodKind>) {
        assert_eq!(PaymentMethodKind::parse(input), expected);
    }

    #[test]
    fn test_snapshot_kind() {
        let snapshot = PaymentMethodSnapshot::PayPal(PayPalDestination {
            email: "seller@example.com".to_string(),
        });
        assert_eq!(snapshot.kind(), PaymentMethodKind::PayPal);
    }
}
