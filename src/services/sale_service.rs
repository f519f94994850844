// src/services/sale_service.rs

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BranchRepository, IngredientRepository, InventoryRepository, ProductRepository, SaleRepository},
    models::{
        branch::Branch,
        ingredient::Ingredient,
        inventory::{business_date_today, DailyInventory, InventoryMovement, MovementType},
        product::Product,
        sale::{
            generate_reference, sale_total, IngredientUsage, ProcessedSaleIngredients, Sale, SaleProduct,
            SALE_REFERENCE_PREFIX,
        },
    },
    services::recipe::{resolve_ingredient_usage, ProductQuantity, UnknownProductPolicy},
};

/// Dados do cliente que acompanham a venda.
#[derive(Debug, Clone)]
pub struct SaleRequest {
    pub client_name: String,
    pub client_ci: String,
    pub discount: Decimal,
    pub products: Vec<ProductQuantity>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredSale {
    pub sale: Sale,
    #[serde(flatten)]
    pub processed: ProcessedSaleIngredients,
}

/// Valida todo o consumo antes de baixar qualquer coisa.
/// O primeiro ingrediente sem saldo suficiente aborta a venda inteira.
pub fn ensure_stock_covers(usage: &[IngredientUsage], stock: &HashMap<Uuid, Ingredient>) -> Result<(), AppError> {
    for used in usage {
        let ingredient = stock.get(&used.ingredient_id).ok_or(AppError::IngredientNotFound)?;
        ingredient.stock_after(-used.quantity)?;
    }
    Ok(())
}

/// Uma baixa já validada: o movimento a anexar e o saldo final do ingrediente no dia.
#[derive(Debug, Clone)]
pub struct StockStep {
    pub movement: InventoryMovement,
    pub final_stock: Decimal,
}

/// Tudo o que a venda vai gravar, calculado antes da primeira escrita.
#[derive(Debug, Clone)]
pub struct SalePlan {
    pub usage: Vec<IngredientUsage>,
    pub steps: Vec<StockStep>,
}

/// Sem inventário aberto não há venda. Com ele, agrega o consumo dos produtos
/// e devolve o inventário para o planejamento.
pub fn admit_sale(
    open_ledger: Option<DailyInventory>,
    lines: &[ProductQuantity],
    products: &HashMap<Uuid, Product>,
    policy: UnknownProductPolicy,
) -> Result<(DailyInventory, Vec<IngredientUsage>), AppError> {
    let ledger = open_ledger.ok_or(AppError::NoOpenInventory)?;

    let usage = resolve_ingredient_usage(lines, products, policy)?;
    if usage.is_empty() {
        return Err(AppError::NoTrackableIngredients);
    }
    Ok((ledger, usage))
}

/// Confere o saldo travado e anexa os movimentos `sale` ao inventário em memória.
/// Se algo falhar, nenhum passo é devolvido e nada chega ao banco.
pub fn plan_sale(
    ledger: &mut DailyInventory,
    usage: Vec<IngredientUsage>,
    stock: &HashMap<Uuid, Ingredient>,
    ticket: &str,
) -> Result<SalePlan, AppError> {
    ensure_stock_covers(&usage, stock)?;

    let mut steps = Vec::with_capacity(usage.len());
    let mut resolved = Vec::with_capacity(usage.len());
    for used in usage {
        let ingredient = stock.get(&used.ingredient_id).ok_or(AppError::IngredientNotFound)?;
        let movement = InventoryMovement::new(
            ledger.id,
            ingredient.id,
            &ingredient.name,
            ingredient.unit,
            MovementType::Sale,
            -used.quantity,
            ticket,
        );
        let final_stock = ledger.apply_movement(movement.clone())?.final_stock;
        steps.push(StockStep { movement, final_stock });

        // Nome e unidade atuais do ingrediente, não a cópia da receita.
        resolved.push(IngredientUsage { name: ingredient.name.clone(), unit: ingredient.unit, ..used });
    }

    Ok(SalePlan { usage: resolved, steps })
}

#[derive(Clone)]
pub struct SaleService {
    branch_repo: BranchRepository,
    ingredient_repo: IngredientRepository,
    inventory_repo: InventoryRepository,
    product_repo: ProductRepository,
    sale_repo: SaleRepository,
    unknown_product_policy: UnknownProductPolicy,
    pool: PgPool,
}

impl SaleService {
    pub fn new(
        branch_repo: BranchRepository,
        ingredient_repo: IngredientRepository,
        inventory_repo: InventoryRepository,
        product_repo: ProductRepository,
        sale_repo: SaleRepository,
        unknown_product_policy: UnknownProductPolicy,
        pool: PgPool,
    ) -> Self {
        Self {
            branch_repo,
            ingredient_repo,
            inventory_repo,
            product_repo,
            sale_repo,
            unknown_product_policy,
            pool,
        }
    }

    /// Baixa os ingredientes consumidos e grava a venda, tudo numa transação.
    /// Qualquer falha desfaz estoque, movimentos e venda juntos.
    #[tracing::instrument(skip(self, request), fields(lines = request.products.len()))]
    pub async fn register_sale(&self, name_branch: &str, request: SaleRequest) -> Result<RegisteredSale, AppError> {
        let mut tx = self.pool.begin().await?;

        let branch = self.branch_repo.get_by_name(&mut *tx, name_branch).await?;
        let (processed, products) = self.process_sale_ingredients(&mut tx, &branch, &request.products).await?;
        let sale = self
            .create_sale(&mut tx, &branch, &request, &products, &processed.ticket_number)
            .await?;

        tx.commit().await?;

        tracing::info!(
            ticket = %processed.ticket_number,
            total = %sale.total_amount,
            ingredients = processed.ingredient_usage.len(),
            "🧾 Venda registrada"
        );
        Ok(RegisteredSale { sale, processed })
    }

    /// Calcula o consumo da venda e aplica no estoque e no inventário aberto do dia.
    async fn process_sale_ingredients(
        &self,
        conn: &mut PgConnection,
        branch: &Branch,
        lines: &[ProductQuantity],
    ) -> Result<(ProcessedSaleIngredients, HashMap<Uuid, Product>), AppError> {
        // Primeira trava: o inventário do dia.
        let open_ledger = self
            .inventory_repo
            .lock_open_for_day(&mut *conn, branch.id, business_date_today())
            .await?;

        let mut product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        product_ids.sort();
        product_ids.dedup();
        let products = self.product_repo.find_with_recipes(&mut *conn, &product_ids).await?;

        let (header, usage) = admit_sale(open_ledger, lines, &products, self.unknown_product_policy)?;

        // `usage` já vem ordenado por id: as travas seguem sempre a mesma ordem.
        let ingredient_ids: Vec<Uuid> = usage.iter().map(|u| u.ingredient_id).collect();
        let locked: HashMap<Uuid, Ingredient> = self
            .ingredient_repo
            .lock_many(&mut *conn, &ingredient_ids)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let ticket_number = generate_reference(SALE_REFERENCE_PREFIX);
        let mut ledger = self.inventory_repo.hydrate(&mut *conn, header).await?;
        let plan = plan_sale(&mut ledger, usage, &locked, &ticket_number)?;

        for step in &plan.steps {
            let movement = &step.movement;
            self.ingredient_repo
                .apply_stock_delta(&mut *conn, movement.ingredient_id, movement.quantity)
                .await?
                .ok_or_else(|| AppError::InsufficientStock {
                    ingredient: movement.ingredient_name.clone(),
                    current_stock: locked
                        .get(&movement.ingredient_id)
                        .map(|i| i.current_stock)
                        .unwrap_or_default(),
                    unit: movement.unit,
                })?;
            self.inventory_repo.insert_movement(&mut *conn, movement).await?;
            self.inventory_repo
                .update_final_stock(&mut *conn, ledger.id, movement.ingredient_id, step.final_stock)
                .await?;
        }

        Ok((ProcessedSaleIngredients { ingredient_usage: plan.usage, ticket_number }, products))
    }

    async fn create_sale(
        &self,
        conn: &mut PgConnection,
        branch: &Branch,
        request: &SaleRequest,
        products: &HashMap<Uuid, Product>,
        ticket: &str,
    ) -> Result<Sale, AppError> {
        let sale_id = Uuid::new_v4();

        // Linhas de produto inexistente só chegam aqui com a política `Skip`.
        let lines: Vec<SaleProduct> = request
            .products
            .iter()
            .filter_map(|line| {
                products.get(&line.product_id).map(|product| SaleProduct {
                    sale_id,
                    product_id: product.id,
                    name: product.name_product.clone(),
                    price: product.price,
                    quantity: line.quantity,
                })
            })
            .collect();

        let draft = Sale {
            id: sale_id,
            branch_id: branch.id,
            ticket: ticket.to_string(),
            client_name: request.client_name.trim().to_string(),
            client_ci: request.client_ci.trim().to_string(),
            discount: request.discount,
            total_amount: sale_total(&lines, request.discount),
            sale_date: Utc::now(),
            products: Vec::new(),
        };

        let mut sale = self.sale_repo.insert_sale(&mut *conn, &draft).await?;
        for (position, line) in lines.iter().enumerate() {
            self.sale_repo.insert_product(&mut *conn, position as i32, line).await?;
        }
        sale.products = lines;
        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ingredient::IngredientUnit, product::RecipeLine};
    use chrono::NaiveDate;

    fn chicken(stock: i64) -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            name: "chicken".into(),
            unit: IngredientUnit::Kg,
            current_stock: Decimal::from(stock),
            cost: Decimal::from(12),
        }
    }

    fn broaster(ingredient: &Ingredient, amount: i64) -> Product {
        let id = Uuid::new_v4();
        Product {
            id,
            name_product: "broaster".into(),
            price: Decimal::from(30),
            recipe: vec![RecipeLine {
                product_id: id,
                ingredient_id: ingredient.id,
                name: ingredient.name.clone(),
                amount: Decimal::from(amount),
                unit: ingredient.unit,
            }],
        }
    }

    fn stock_of(ingredients: &[&Ingredient]) -> HashMap<Uuid, Ingredient> {
        ingredients.iter().map(|i| (i.id, (*i).clone())).collect()
    }

    fn open_for(stock: &[Ingredient]) -> DailyInventory {
        let day = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        DailyInventory::open(Uuid::new_v4(), day, vec![], None, stock)
    }

    // Admite e planeja como o serviço; o banco é o mapa de estoque, que só
    // recebe os deltas de um plano completo. Devolve o inventário atualizado.
    fn sell(
        ledger: Option<&DailyInventory>,
        stock: &mut HashMap<Uuid, Ingredient>,
        product: &Product,
        quantity: i32,
    ) -> Result<(DailyInventory, SalePlan), AppError> {
        let products: HashMap<Uuid, Product> = [(product.id, product.clone())].into_iter().collect();
        let lines = [ProductQuantity { product_id: product.id, quantity }];

        let (mut ledger, usage) = admit_sale(ledger.cloned(), &lines, &products, UnknownProductPolicy::Reject)?;
        let plan = plan_sale(&mut ledger, usage, stock, "TK-1-1")?;

        for step in &plan.steps {
            let ingredient = stock.get_mut(&step.movement.ingredient_id).unwrap();
            ingredient.current_stock = ingredient.stock_after(step.movement.quantity)?;
        }
        Ok((ledger, plan))
    }

    #[test]
    fn sale_consumes_recipe_amount_times_quantity() {
        let chicken = chicken(10);
        let product = broaster(&chicken, 3);
        let ledger = open_for(&[chicken.clone()]);
        let mut stock = stock_of(&[&chicken]);

        let (ledger, plan) = sell(Some(&ledger), &mut stock, &product, 2).unwrap();

        assert_eq!(stock[&chicken.id].current_stock, Decimal::from(4));
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].final_stock, Decimal::from(4));
        assert_eq!(plan.usage[0].quantity, Decimal::from(6));

        let record = ledger.ingredient(chicken.id).unwrap();
        assert_eq!(record.movements.len(), 1);
        assert_eq!(record.movements[0].movement_type, MovementType::Sale);
        assert_eq!(record.movements[0].quantity, Decimal::from(-6));
        assert_eq!(record.movements[0].reference, "TK-1-1");
        assert_eq!(record.final_stock, Decimal::from(4));
    }

    #[test]
    fn sale_beyond_stock_changes_nothing() {
        let chicken = chicken(10);
        let three_kg = broaster(&chicken, 3);
        let five_kg = broaster(&chicken, 5);
        let mut stock = stock_of(&[&chicken]);
        let (ledger, _) = sell(Some(&open_for(&[chicken.clone()])), &mut stock, &three_kg, 2).unwrap();

        let err = sell(Some(&ledger), &mut stock, &five_kg, 1).unwrap_err();

        match err {
            AppError::InsufficientStock { ingredient, current_stock, .. } => {
                assert_eq!(ingredient, "chicken");
                assert_eq!(current_stock, Decimal::from(4));
            }
            other => panic!("esperava InsufficientStock, veio {:?}", other),
        }
        assert_eq!(stock[&chicken.id].current_stock, Decimal::from(4));
        assert_eq!(ledger.ingredient(chicken.id).unwrap().movements.len(), 1);
    }

    #[test]
    fn sale_without_open_ledger_is_refused_before_any_stock_change() {
        let chicken = chicken(10);
        let product = broaster(&chicken, 3);
        let mut stock = stock_of(&[&chicken]);

        let err = sell(None, &mut stock, &product, 1).unwrap_err();

        assert!(matches!(err, AppError::NoOpenInventory));
        assert_eq!(stock[&chicken.id].current_stock, Decimal::from(10));
    }

    #[test]
    fn missing_ledger_wins_over_unknown_products() {
        let lines = [ProductQuantity { product_id: Uuid::new_v4(), quantity: 1 }];
        let err = admit_sale(None, &lines, &HashMap::new(), UnknownProductPolicy::Reject).unwrap_err();
        assert!(matches!(err, AppError::NoOpenInventory));
    }

    #[test]
    fn products_without_recipe_leave_nothing_to_sell() {
        let chicken = chicken(10);
        let mut soda = broaster(&chicken, 1);
        soda.recipe.clear();
        let products: HashMap<Uuid, Product> = [(soda.id, soda.clone())].into_iter().collect();
        let lines = [ProductQuantity { product_id: soda.id, quantity: 2 }];

        let err = admit_sale(Some(open_for(&[chicken])), &lines, &products, UnknownProductPolicy::Reject).unwrap_err();
        assert!(matches!(err, AppError::NoTrackableIngredients));
    }

    #[test]
    fn one_short_ingredient_leaves_the_ledger_untouched() {
        let plenty = chicken(100);
        let mut short = chicken(1);
        short.name = "potato".into();
        let mut ledger = open_for(&[plenty.clone(), short.clone()]);
        let mut usage = vec![
            IngredientUsage { ingredient_id: plenty.id, name: "chicken".into(), quantity: Decimal::from(5), unit: IngredientUnit::Kg },
            IngredientUsage { ingredient_id: short.id, name: "potato".into(), quantity: Decimal::from(2), unit: IngredientUnit::Kg },
        ];
        usage.sort_by_key(|u| u.ingredient_id);

        let err = plan_sale(&mut ledger, usage, &stock_of(&[&plenty, &short]), "TK-1-1").unwrap_err();

        assert!(matches!(err, AppError::InsufficientStock { ingredient, .. } if ingredient == "potato"));
        assert!(ledger.ingredients.iter().all(|line| line.movements.is_empty()));
    }

    #[test]
    fn plan_reports_current_ingredient_names() {
        let mut chicken = chicken(10);
        let product = broaster(&chicken, 1);
        chicken.name = "pollo".into();
        let mut stock = stock_of(&[&chicken]);

        let (_, plan) = sell(Some(&open_for(&[chicken.clone()])), &mut stock, &product, 1).unwrap();

        assert_eq!(plan.usage[0].name, "pollo");
        assert_eq!(plan.steps[0].movement.ingredient_name, "pollo");
    }

    #[test]
    fn purchase_after_sale_keeps_ledger_and_stock_in_step() {
        let chicken = chicken(10);
        let product = broaster(&chicken, 3);
        let mut stock = stock_of(&[&chicken]);
        let (mut ledger, _) = sell(Some(&open_for(&[chicken.clone()])), &mut stock, &product, 2).unwrap();

        let delta = Decimal::from(20);
        let movement = InventoryMovement::new(
            ledger.id, chicken.id, &chicken.name, chicken.unit, MovementType::for_manual_delta(delta), delta, "STK-1-1",
        );
        let final_stock = ledger.apply_movement(movement).unwrap().final_stock;
        let current = stock[&chicken.id].stock_after(delta).unwrap();

        assert_eq!(current, Decimal::from(24));
        assert_eq!(final_stock, current);
        assert!(ledger.is_reconciled());
    }

    #[test]
    fn validation_reports_the_first_short_ingredient() {
        let plenty = chicken(100);
        let mut short = chicken(1);
        short.name = "potato".into();
        let usage = vec![
            IngredientUsage { ingredient_id: plenty.id, name: "chicken".into(), quantity: Decimal::from(5), unit: IngredientUnit::Kg },
            IngredientUsage { ingredient_id: short.id, name: "potato".into(), quantity: Decimal::from(2), unit: IngredientUnit::Kg },
        ];

        let err = ensure_stock_covers(&usage, &stock_of(&[&plenty, &short])).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { ingredient, .. } if ingredient == "potato"));

        let err = ensure_stock_covers(&usage, &stock_of(&[&plenty])).unwrap_err();
        assert!(matches!(err, AppError::IngredientNotFound));
    }
}
