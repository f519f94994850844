use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "es";

// (chave, espanhol, inglês)
const CATALOG: &[(&str, &str, &str)] = &[
    // --- erros ---
    ("error.validation", "Uno o más campos son inválidos.", "One or more fields are invalid."),
    ("error.invalid_input", "Datos de entrada inválidos.", "Invalid input data."),
    ("error.invalid_unit", "Unidad de medida no válida: {unit}", "Invalid unit of measure: {unit}"),
    ("error.invalid_token", "Token inválido o ausente.", "Invalid or missing token."),
    ("error.branch_not_found", "Sucursal no encontrada", "Branch not found"),
    ("error.ingredient_not_found", "Ingrediente no encontrado en esta sucursal", "Ingredient not found in this branch"),
    ("error.inventory_not_found", "Inventario no encontrado", "Inventory not found"),
    ("error.inventory_not_in_branch", "Este inventario no pertenece a la sucursal especificada", "This inventory does not belong to the given branch"),
    ("error.inventory_already_exists", "Ya existe un inventario para el día de hoy en esta sucursal", "An inventory already exists for today in this branch"),
    ("error.no_open_inventory", "No hay un inventario abierto para el día de hoy", "There is no open inventory for today"),
    ("error.inventory_closed", "El inventario ya está cerrado", "The inventory is already closed"),
    ("error.ingredient_not_in_inventory", "Ingrediente {name} no encontrado en el inventario diario", "Ingredient {name} is not part of today's inventory"),
    ("error.no_trackable_ingredients", "No se encontraron ingredientes para los productos especificados", "No ingredients found for the given products"),
    ("error.insufficient_stock", "Stock insuficiente de {name}. Stock actual: {stock} {unit}", "Insufficient stock of {name}. Current stock: {stock} {unit}"),
    ("error.invalid_reference", "Referencia inválida: {id}", "Invalid reference: {id}"),
    ("error.ingredient_name_exists", "Ya existe un ingrediente llamado {name}", "An ingredient named {name} already exists"),
    ("error.internal", "Ocurrió un error inesperado.", "An unexpected error occurred."),
    // --- sucesso ---
    ("inventory.opened", "Inventario registrado exitosamente en la sucursal {branch}", "Inventory registered in branch {branch}"),
    ("inventory.closed", "Inventario cerrado exitosamente", "Inventory closed"),
    ("inventory.fetched", "Inventario obtenido exitosamente", "Inventory fetched"),
    ("inventory.today", "Inventario del día obtenido exitosamente", "Today's inventory fetched"),
    ("inventory.updated", "Inventario actualizado exitosamente", "Inventory updated"),
    ("ingredient.registered", "Ingrediente registrado exitosamente en la sucursal {branch}", "Ingredient registered in branch {branch}"),
    ("ingredient.listed", "Ingredientes obtenidos exitosamente de la sucursal {branch}", "Ingredients fetched for branch {branch}"),
    ("ingredient.updated", "Ingrediente actualizado exitosamente", "Ingredient updated"),
    ("ingredient.stock_updated", "Stock actualizado exitosamente", "Stock updated"),
    ("sale.registered", "Venta registrada exitosamente en la sucursal {branch}", "Sale registered in branch {branch}"),
];

/// Catálogo de mensagens por idioma. Barato de clonar (vive no `AppState`).
#[derive(Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut es = HashMap::new();
        let mut en = HashMap::new();
        for (key, es_msg, en_msg) in CATALOG {
            es.insert(*key, *es_msg);
            en.insert(*key, *en_msg);
        }

        let mut catalogs = HashMap::new();
        catalogs.insert("es", es);
        catalogs.insert("en", en);
        Self { catalogs: Arc::new(catalogs) }
    }

    /// Traduz `key` para `lang` (cai para o idioma padrão) e interpola `{arg}`.
    /// Chave desconhecida devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .copied()
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |msg, (name, value)| {
            msg.replace(&format!("{{{}}}", name), value)
        })
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_and_interpolates() {
        let store = I18nStore::new();
        let msg = store.translate("en", "inventory.opened", &[("branch", "central".into())]);
        assert_eq!(msg, "Inventory registered in branch central");
    }

    #[test]
    fn unknown_language_falls_back_to_spanish() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate("pt", "error.branch_not_found", &[]),
            "Sucursal no encontrada"
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        assert_eq!(I18nStore::new().translate("es", "nope.missing", &[]), "nope.missing");
    }
}
