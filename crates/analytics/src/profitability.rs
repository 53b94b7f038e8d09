//! Per-menu-item margins with rule-based pricing advice.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use bistro_core::Cents;
use bistro_menu::{MenuItem, MenuItemId};
use bistro_sales::TransactionRecord;

/// Number of top and bottom performers reported by default.
pub const DEFAULT_TOP_K: usize = 5;

/// `round((revenue - cost) / revenue × 100)`, or `0` without revenue.
pub fn profit_margin(revenue: f64, cost: f64) -> i64 {
    if revenue > 0.0 {
        ((revenue - cost) / revenue * 100.0).round() as i64
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPerformance {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub category_name: String,
    pub sales_quantity: u64,
    pub revenue: f64,
    pub cost: f64,
    pub profit_margin: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingAdvice {
    PriceIncreaseCandidate,
    PromoteAtPeakTimes,
    BundleInComboOffer,
    ReducePortionOrRaisePrice,
    ReplaceWithHigherMarginAlternative,
    SimplifyProduction,
}

impl PricingAdvice {
    pub fn for_top_performer(item: &MenuItemPerformance) -> Self {
        if item.profit_margin > 80 {
            PricingAdvice::PriceIncreaseCandidate
        } else if is_drink(&item.category_name) {
            PricingAdvice::PromoteAtPeakTimes
        } else {
            PricingAdvice::BundleInComboOffer
        }
    }

    pub fn for_underperformer(item: &MenuItemPerformance) -> Self {
        if item.profit_margin < 25 {
            PricingAdvice::ReducePortionOrRaisePrice
        } else if is_drink(&item.category_name) {
            PricingAdvice::ReplaceWithHigherMarginAlternative
        } else {
            PricingAdvice::SimplifyProduction
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PricingAdvice::PriceIncreaseCandidate => "price increase candidate",
            PricingAdvice::PromoteAtPeakTimes => "promote at peak times",
            PricingAdvice::BundleInComboOffer => "bundle in combo offer",
            PricingAdvice::ReducePortionOrRaisePrice => "reduce portion or raise price",
            PricingAdvice::ReplaceWithHigherMarginAlternative => "replace with higher-margin alternative",
            PricingAdvice::SimplifyProduction => "simplify production",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRecommendation {
    pub menu_item_id: MenuItemId,
    pub item_name: String,
    pub profit_margin: i64,
    pub advice: PricingAdvice,
    pub message: String,
}

impl PricingRecommendation {
    fn new(item: &MenuItemPerformance, advice: PricingAdvice) -> Self {
        Self {
            menu_item_id: item.menu_item_id,
            item_name: item.name.clone(),
            profit_margin: item.profit_margin,
            advice,
            message: format!("{}: {}", item.name, advice.message()),
        }
    }
}

/// Menu profitability report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuProfitability {
    pub top_performers: Vec<MenuItemPerformance>,
    pub underperformers: Vec<MenuItemPerformance>,
    pub pricing_recommendations: Vec<PricingRecommendation>,
}

fn is_drink(category_name: &str) -> bool {
    category_name.trim().eq_ignore_ascii_case(bistro_menu::DRINKS_CATEGORY)
}

#[derive(Default)]
struct SalesTally {
    quantity: u64,
    revenue: Cents,
}

/// Sales performance of every menu item, counting sale-bearing transactions
/// only. Unsold items report zero quantity, revenue and margin. Line items
/// for unknown menu items are ignored.
pub fn item_performance(menu: &[MenuItem], transactions: &[TransactionRecord]) -> Vec<MenuItemPerformance> {
    let known: HashSet<MenuItemId> = menu.iter().map(|m| m.id).collect();
    let mut tallies: BTreeMap<MenuItemId, SalesTally> = BTreeMap::new();

    for line in transactions
        .iter()
        .filter(|t| t.status.is_sale())
        .flat_map(|t| t.line_items.iter())
        .filter(|l| known.contains(&l.menu_item_id))
    {
        let tally = tallies.entry(line.menu_item_id).or_default();
        tally.quantity += u64::from(line.quantity);
        tally.revenue += line.line_total();
    }

    menu.iter()
        .map(|item| {
            let (quantity, revenue) = tallies
                .get(&item.id)
                .map(|t| (t.quantity, t.revenue))
                .unwrap_or_default();
            let revenue = revenue.as_units();
            let cost = Cents(item.unit_cost.get().saturating_mul(quantity)).as_units();
            MenuItemPerformance {
                menu_item_id: item.id,
                name: item.name.clone(),
                category_name: item.category_name.clone(),
                sales_quantity: quantity,
                revenue,
                cost,
                profit_margin: profit_margin(revenue, cost),
            }
        })
        .collect()
}

/// Top-`k` items by margin (descending) and bottom-`k` items (ascending),
/// each taken from the full menu, with one pricing recommendation per entry.
///
/// On a menu with fewer than `2k` items an item can appear in both lists
/// and then gets both pieces of advice.
pub fn rank_profitability(menu: &[MenuItem], transactions: &[TransactionRecord], k: usize) -> MenuProfitability {
    let performance = item_performance(menu, transactions);

    let mut top_performers = performance.clone();
    top_performers.sort_by(|a, b| {
        b.profit_margin
            .cmp(&a.profit_margin)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.menu_item_id.cmp(&b.menu_item_id))
    });
    top_performers.truncate(k);

    let mut underperformers = performance;
    underperformers.sort_by(|a, b| {
        a.profit_margin
            .cmp(&b.profit_margin)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.menu_item_id.cmp(&b.menu_item_id))
    });
    underperformers.truncate(k);

    let pricing_recommendations = top_performers
        .iter()
        .map(|p| PricingRecommendation::new(p, PricingAdvice::for_top_performer(p)))
        .chain(
            underperformers
                .iter()
                .map(|p| PricingRecommendation::new(p, PricingAdvice::for_underperformer(p))),
        )
        .collect();

    debug!(
        top = top_performers.len(),
        bottom = underperformers.len(),
        "menu profitability ranked"
    );

    MenuProfitability {
        top_performers,
        underperformers,
        pricing_recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::{RecordId, StaffId};
    use bistro_sales::{LineItem, TransactionId, TransactionStatus};
    use chrono::{TimeZone, Utc};

    fn menu_item(n: u128, name: &str, category: &str, unit_cost: u64) -> MenuItem {
        MenuItem::new(
            MenuItemId::new(RecordId::from_u128(n)),
            name,
            category,
            Cents(unit_cost),
        )
    }

    fn sale(n: u128, status: TransactionStatus, lines: Vec<LineItem>) -> TransactionRecord {
        let total = lines.iter().map(|l| l.line_total()).sum();
        TransactionRecord {
            id: TransactionId::new(RecordId::from_u128(1_000 + n)),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            total,
            status,
            line_items: lines,
            staff_id: StaffId::from_u128(1),
        }
    }

    fn line(item: &MenuItem, qty: u32, price: u64) -> LineItem {
        LineItem::new(item.id, qty, Cents(price))
    }

    #[test]
    fn margin_edge_cases() {
        assert_eq!(profit_margin(50.0, 0.0), 100);
        assert_eq!(profit_margin(0.0, 0.0), 0);
        assert_eq!(profit_margin(0.0, 10.0), 0);
        assert_eq!(profit_margin(100.0, 150.0), -50);
        assert_eq!(profit_margin(3.0, 1.0), 67);
    }

    #[test]
    fn performance_counts_only_sale_bearing_known_items() {
        let burger = menu_item(1, "Burger", "Mains", 300);
        let ghost = MenuItemId::new(RecordId::from_u128(99));
        let txns = vec![
            sale(1, TransactionStatus::Paid, vec![line(&burger, 2, 1_000)]),
            sale(2, TransactionStatus::Pending, vec![line(&burger, 1, 1_000)]),
            sale(3, TransactionStatus::Refunded, vec![line(&burger, 5, 1_000)]),
            sale(4, TransactionStatus::Paid, vec![LineItem::new(ghost, 3, Cents(500))]),
        ];

        let perf = item_performance(&[burger], &txns);
        assert_eq!(perf.len(), 1);
        assert_eq!(perf[0].sales_quantity, 3);
        assert_eq!(perf[0].revenue, 30.0);
        assert_eq!(perf[0].cost, 9.0);
        assert_eq!(perf[0].profit_margin, 70);
    }

    #[test]
    fn unsold_items_rank_with_zero_margin() {
        let soup = menu_item(1, "Soup", "Starters", 100);
        let report = rank_profitability(&[soup], &[], 5);
        assert_eq!(report.top_performers.len(), 1);
        assert_eq!(report.underperformers.len(), 1);
        let unsold = &report.underperformers[0];
        assert_eq!(unsold.sales_quantity, 0);
        assert_eq!(unsold.revenue, 0.0);
        assert_eq!(unsold.profit_margin, 0);
        assert_eq!(
            report.pricing_recommendations.last().map(|r| r.advice),
            Some(PricingAdvice::ReducePortionOrRaisePrice)
        );
    }

    #[test]
    fn ranks_top_and_bottom_with_advice() {
        let water = menu_item(1, "Water", "drinks", 10);
        let steak = menu_item(2, "Steak", "Mains", 1_500);
        let salad = menu_item(3, "Salad", "Starters", 200);
        let cola = menu_item(4, "Cola", "Drinks", 120);
        let pasta = menu_item(5, "Pasta", "Mains", 500);
        let txns = vec![sale(
            1,
            TransactionStatus::Completed,
            vec![
                line(&water, 10, 200),  // 95%
                line(&steak, 2, 1_800), // 17%
                line(&salad, 4, 800),   // 75%
                line(&cola, 5, 300),    // 60%
                line(&pasta, 3, 1_000), // 50%
            ],
        )];
        let menu = vec![water, steak, salad, cola, pasta];

        let report = rank_profitability(&menu, &txns, 2);
        let top: Vec<&str> = report.top_performers.iter().map(|p| p.name.as_str()).collect();
        let bottom: Vec<&str> = report.underperformers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(top, vec!["Water", "Salad"]);
        assert_eq!(bottom, vec!["Steak", "Pasta"]);

        let advice: Vec<PricingAdvice> = report.pricing_recommendations.iter().map(|r| r.advice).collect();
        assert_eq!(
            advice,
            vec![
                PricingAdvice::PriceIncreaseCandidate,
                PricingAdvice::BundleInComboOffer,
                PricingAdvice::ReducePortionOrRaisePrice,
                PricingAdvice::SimplifyProduction,
            ]
        );
        assert_eq!(report.pricing_recommendations[0].message, "Water: price increase candidate");
    }

    #[test]
    fn drinks_advice_is_case_insensitive() {
        let perf = |margin: i64, category: &str| MenuItemPerformance {
            menu_item_id: MenuItemId::new(RecordId::from_u128(1)),
            name: "Lemonade".into(),
            category_name: category.into(),
            sales_quantity: 1,
            revenue: 1.0,
            cost: 0.5,
            profit_margin: margin,
        };
        assert_eq!(
            PricingAdvice::for_top_performer(&perf(60, "DRINKS")),
            PricingAdvice::PromoteAtPeakTimes
        );
        assert_eq!(
            PricingAdvice::for_underperformer(&perf(40, "drinks")),
            PricingAdvice::ReplaceWithHigherMarginAlternative
        );
    }

    #[test]
    fn small_menu_fills_both_lists_independently() {
        let a = menu_item(1, "A", "Mains", 100);
        let b = menu_item(2, "B", "Mains", 900);
        let c = menu_item(3, "C", "Mains", 500);
        let unsold = menu_item(4, "D", "Mains", 200);
        let txns = vec![sale(
            1,
            TransactionStatus::Paid,
            vec![line(&a, 1, 1_000), line(&b, 1, 1_000), line(&c, 1, 1_000)],
        )];
        let report = rank_profitability(&[a, b, c, unsold], &txns, 5);

        fn ranked(list: &[MenuItemPerformance]) -> Vec<(&str, i64)> {
            list.iter().map(|p| (p.name.as_str(), p.profit_margin)).collect()
        }
        assert_eq!(
            ranked(&report.top_performers),
            vec![("A", 90), ("C", 50), ("B", 10), ("D", 0)]
        );
        assert_eq!(
            ranked(&report.underperformers),
            vec![("D", 0), ("B", 10), ("C", 50), ("A", 90)]
        );

        let advice_for = |name: &str| -> Vec<PricingAdvice> {
            report
                .pricing_recommendations
                .iter()
                .filter(|r| r.item_name == name)
                .map(|r| r.advice)
                .collect()
        };
        assert_eq!(
            advice_for("B"),
            vec![PricingAdvice::BundleInComboOffer, PricingAdvice::ReducePortionOrRaisePrice]
        );
        assert_eq!(report.pricing_recommendations.len(), 8);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: free items earn 100, unsold items earn 0.
            #[test]
            fn margin_bounds(revenue in 0.01f64..1e7, cost in 0.0f64..1e7) {
                prop_assert_eq!(profit_margin(revenue, 0.0), 100);
                prop_assert_eq!(profit_margin(0.0, cost), 0);
                prop_assert!(profit_margin(revenue, cost) <= 100);
            }
        }
    }
}
