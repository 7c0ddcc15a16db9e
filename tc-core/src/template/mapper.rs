//! Flattens a [`TransactionFormData`] into the `{{placeholder}}` values the
//! cover-sheet templates expect.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::models::TransactionFormData;
use crate::validation::fields::{parse_amount, parse_date, parse_percentage};
use crate::validation::validate_zip;

static ZIP_IN_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").expect("valid zip search regex"));

fn yes_no(flag: bool) -> String {
    String::from(if flag { "Yes" } else { "No" })
}

/// `450000` → `$450,000.00`. Text that is not an amount is passed through
/// trimmed so nothing the agent typed is lost.
pub fn format_currency(raw: &str) -> String {
    let Some(amount) = parse_amount(raw) else {
        return raw.trim().to_string();
    };

    let rounded = amount.round_dp(2);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = match text.split_once('.') {
        Some(parts) => parts,
        None => (text.as_str(), "00"),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}

/// `2.50` → `2.5%`.
pub fn format_percentage(raw: &str) -> String {
    match parse_percentage(raw) {
        Some(pct) => format!("{}%", pct.normalize()),
        None => raw.trim().to_string(),
    }
}

fn format_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%m/%d/%Y").to_string(),
        None => raw.trim().to_string(),
    }
}

/// The last zip code that appears in a free-text address.
pub fn extract_zip(address: &str) -> Option<String> {
    ZIP_IN_TEXT_RE
        .find_iter(address)
        .map(|m| m.as_str())
        .filter(|candidate| validate_zip(candidate))
        .last()
        .map(str::to_string)
}

/// Build the placeholder map for one form.
///
/// Booleans render as `Yes`/`No`, money as `$1,234.00`, percentages with a
/// trailing `%` and dates as `MM/DD/YYYY`. Clients are numbered from 1
/// (`client1Name`, `client2Name`, ...) and also joined into `clientNames`.
pub fn flatten(data: &TransactionFormData) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        values.insert(key.to_string(), value);
    };

    let agent = &data.agent_data;
    put("agentRole", agent.role.map(|r| r.label().to_string()).unwrap_or_default());
    put("agentEmail", agent.email.clone());
    put("agentPhone", agent.phone.clone());

    let property = &data.property_data;
    put("mlsNumber", property.mls_number.clone());
    put("propertyAddress", property.address.clone());
    put("zipCode", extract_zip(&property.address).unwrap_or_default());
    put("salePrice", format_currency(&property.sale_price));
    put("propertyStatus", property.status.clone());
    put("county", property.county.clone());
    put("propertyType", property.property_type.clone());
    put("closingDate", format_date(&property.closing_date));
    put("isWinterized", yes_no(property.is_winterized));
    put("updateMls", yes_no(property.update_mls));

    let names: Vec<&str> = data
        .clients
        .iter()
        .map(|c| c.name.trim())
        .filter(|n| !n.is_empty())
        .collect();
    put("clientNames", names.join(", "));
    put("clientCount", data.clients.len().to_string());
    for (i, client) in data.clients.iter().enumerate() {
        let n = i + 1;
        put(&format!("client{n}Name"), client.name.clone());
        put(&format!("client{n}Email"), client.email.clone());
        put(&format!("client{n}Phone"), client.phone.clone());
        put(&format!("client{n}Address"), client.address.clone());
        put(&format!("client{n}MaritalStatus"), client.marital_status.clone());
        put(
            &format!("client{n}Type"),
            client.client_type.map(|t| t.as_str().to_string()).unwrap_or_default(),
        );
    }

    let commission = &data.commission_data;
    put(
        "totalCommissionPercentage",
        format_percentage(&commission.total_commission_percentage),
    );
    put(
        "listingAgentPercentage",
        format_percentage(&commission.listing_agent_percentage),
    );
    put(
        "buyersAgentPercentage",
        format_percentage(&commission.buyers_agent_percentage),
    );
    put("hasBrokerFee", yes_no(commission.has_broker_fee));
    put("brokerFeeAmount", format_currency(&commission.broker_fee_amount));
    put("hasSellersAssist", yes_no(commission.has_sellers_assist));
    put("sellersAssist", format_currency(&commission.sellers_assist));
    put("isReferral", yes_no(commission.is_referral));
    put("referralParty", commission.referral_party.clone());
    put("referralFee", commission.referral_fee.trim().to_string());
    put("brokerEin", commission.broker_ein.clone());

    let details = &data.property_details_data;
    put("resaleCertRequired", yes_no(details.resale_cert_required));
    put("hoaName", details.hoa_name.clone());
    put("coRequired", yes_no(details.co_required));
    put("municipality", details.municipality.clone());
    put("firstRightOfRefusal", yes_no(details.first_right_of_refusal));
    put("firstRightName", details.first_right_name.clone());
    put("attorneyRepresentation", yes_no(details.attorney_representation));
    put("attorneyName", details.attorney_name.clone());

    let warranty = &data.warranty_data;
    put("homeWarranty", yes_no(warranty.home_warranty));
    put("warrantyCompany", warranty.warranty_company.clone());
    put("warrantyCost", format_currency(&warranty.warranty_cost));
    put("paidBy", warranty.paid_by.clone());

    put("titleCompanyName", data.title_company_data.title_company_name.clone());
    put("confirmDocuments", yes_no(data.documents_data.confirm_documents));

    let info = &data.additional_info_data;
    put("specialInstructions", info.special_instructions.clone());
    put("urgentIssues", info.urgent_issues.clone());
    put("notes", info.notes.clone());

    let signature = &data.signature_data;
    put("signature", signature.signature.clone());
    put("termsAccepted", yes_no(signature.terms_accepted));
    put("infoConfirmed", yes_no(signature.info_confirmed));
    put(
        "dateSubmitted",
        signature
            .date_submitted
            .map(|d| d.format("%m/%d/%Y").to_string())
            .unwrap_or_default(),
    );

    // The signed name wins over the contact name typed on step 1.
    let agent_name = if signature.agent_name.trim().is_empty() {
        agent.name.clone()
    } else {
        signature.agent_name.clone()
    };
    put("agentName", agent_name);

    values
}
