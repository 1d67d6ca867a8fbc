//! Built-in Austin real-estate documents.

use super::Document;

/// Detailed listings, market and neighbourhood documents for semantic search.
pub const LISTINGS: [&str; 6] = [
    "Property listing: 123 Main Street, Austin TX 78701. This beautiful 3-bedroom, 2-bathroom home sits on 0.25 acres in the heart of downtown Austin. Built in 2018, it features modern appliances, hardwood floors, and granite countertops. The home is priced at $450,000 and is located in the highly-rated Austin ISD school district. Walking distance to restaurants and entertainment.",
    "Property listing: 456 Oak Avenue, Austin TX 78704. Stunning 4-bedroom, 3-bathroom family home built in 2020. Features include a resort-style swimming pool, spacious backyard perfect for entertaining, upgraded kitchen with stainless steel appliances, and a two-car garage. Listed at $620,000 in the desirable South Austin neighborhood with easy access to downtown.",
    "Austin Real Estate Market Report Q4 2024: The Austin metropolitan area continues to show strong growth with median home prices reaching $485,000, representing an 8% increase year-over-year. The tech industry boom has driven demand, particularly in central Austin neighborhoods. Properties are selling on average within 25 days of listing. First-time homebuyer activity remains strong despite rising interest rates.",
    "Investment Analysis: Austin's real estate market presents excellent opportunities for long-term appreciation. Properties within 10 miles of downtown have shown consistent 10-12% annual appreciation over the past 5 years. The influx of major tech companies including Apple, Google, and Tesla has created sustained demand. Rental properties in university areas yield 6-8% returns.",
    "Neighborhood Guide: Austin TX 78701 (Downtown) - Urban living at its finest. Walk score of 95. Average home price $520,000. Known for high-rise condos, converted lofts, and historic homes. Excellent restaurants, nightlife, and cultural attractions. Public transportation available.",
    "Neighborhood Guide: Austin TX 78704 (South Austin) - Family-friendly area with tree-lined streets. Average home price $465,000. Known for local businesses, food trucks, and community parks. Highly rated schools and safe neighborhoods. 15-minute drive to downtown.",
];

/// Short property and market notes for keyword search.
pub const QUICK_FACTS: [&str; 4] = [
    "Property: 123 Main St, Austin TX. 3 bed, 2 bath. Price: $450,000. Built 2018. Excellent schools nearby.",
    "Property: 456 Oak Ave, Austin TX. 4 bed, 3 bath. Price: $620,000. Built 2020. Swimming pool, large yard.",
    "Market Report: Austin TX average home price increased 8% in 2024. High demand area with tech job growth.",
    "Investment tip: Properties near downtown Austin appreciate 10-12% annually due to tech company expansion.",
];

/// Id of the `index`-th listing (`doc_0` .. `doc_5`).
pub fn listing_id(index: usize) -> String {
    format!("doc_{index}")
}

/// The listings with their ids.
pub fn listing_documents() -> Vec<Document> {
    LISTINGS
        .iter()
        .enumerate()
        .map(|(i, text)| Document::new(listing_id(i), *text))
        .collect()
}

/// The quick facts with ids `fact_0` .. `fact_3`.
pub fn quick_fact_documents() -> Vec<Document> {
    QUICK_FACTS
        .iter()
        .enumerate()
        .map(|(i, text)| Document::new(format!("fact_{i}"), *text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_ids_are_sequential() {
        let ids: Vec<String> = listing_documents().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["doc_0", "doc_1", "doc_2", "doc_3", "doc_4", "doc_5"]);
    }

    #[test]
    fn corpus_mentions_key_facts() {
        assert!(LISTINGS[1].contains("swimming pool"));
        assert!(LISTINGS[4].contains("Walk score of 95"));
        assert!(QUICK_FACTS[0].contains("123 Main St"));
    }

    #[test]
    fn quick_fact_ids() {
        let docs = quick_fact_documents();
        assert_eq!(docs.len(), 4);
        assert_eq!(docs[3].id, "fact_3");
    }
}
