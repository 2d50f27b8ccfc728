//! Initial storefront taxonomy.

use crate::document::TaxonomyDocument;

const SEED: &[(&str, &[&str])] = &[
    ("TOUS", &["Tous les produits"]),
    ("SALONS", &["Salon en L", "Salon en U"]),
    ("CANAPÉS", &["Canapé 2 Places", "Canapé 3 Places", "Fauteuils"]),
    ("CHAMBRE", &["Lits", "Matelas", "Table de Chevet"]),
    (
        "TABLES",
        &["Table Basse", "Table de Salle à Manger", "Table D'appoint"],
    ),
    ("CHAISES", &["Chaises"]),
    (
        "JARDIN",
        &["Ensemble D'extérieur", "Salle à Manger + Chaises"],
    ),
    (
        "MEUBLES",
        &["Consoles", "Armoires", "Bibliothèques", "Buffets", "Meubles TV"],
    ),
    ("DECO", &["Mirroirs"]),
];

/// The document a fresh store starts from.
pub fn seed_document() -> TaxonomyDocument {
    SEED.iter()
        .map(|(category, subs)| {
            (
                category.to_string(),
                subs.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            )
        })
        .collect()
}
