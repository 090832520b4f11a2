use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_customers_table::Migration),
            Box::new(m20240601_000002_create_inventory_items_table::Migration),
            Box::new(m20240601_000003_create_bills_table::Migration),
            Box::new(m20240601_000004_create_bill_line_items_table::Migration),
            Box::new(m20240601_000005_create_payments_table::Migration),
            Box::new(m20240601_000006_create_bill_sequences_table::Migration),
        ]
    }
}

mod m20240601_000001_create_customers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Customers::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::Phone).string().null())
                        .col(ColumnDef::new(Customers::Company).string().null())
                        .col(ColumnDef::new(Customers::Address).string().null())
                        .col(ColumnDef::new(Customers::City).string().null())
                        .col(ColumnDef::new(Customers::State).string().null())
                        .col(ColumnDef::new(Customers::PostalCode).string().null())
                        .col(ColumnDef::new(Customers::Notes).text().null())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_owner_id")
                        .table(Customers::Table)
                        .col(Customers::OwnerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        OwnerId,
        Name,
        Email,
        Phone,
        Company,
        Address,
        City,
        State,
        PostalCode,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000002_create_inventory_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_inventory_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                        .col(ColumnDef::new(InventoryItems::Sku).string().null())
                        .col(ColumnDef::new(InventoryItems::Category).string().null())
                        .col(ColumnDef::new(InventoryItems::Description).text().null())
                        .col(
                            ColumnDef::new(InventoryItems::Unit)
                                .string_len(32)
                                .not_null()
                                .default("piece"),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::MinStockLevel)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_items_owner_sku")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::OwnerId)
                        .col(InventoryItems::Sku)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryItems {
        Table,
        Id,
        OwnerId,
        Name,
        Sku,
        Category,
        Description,
        Unit,
        Quantity,
        UnitPrice,
        MinStockLevel,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000003_create_bills_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_bills_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bills::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bills::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Bills::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(Bills::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Bills::BillNumber).string_len(64).not_null())
                        .col(ColumnDef::new(Bills::IssuedOn).date().not_null())
                        .col(ColumnDef::new(Bills::Subtotal).decimal_len(14, 2).not_null())
                        .col(ColumnDef::new(Bills::TaxRate).decimal_len(5, 2).not_null())
                        .col(ColumnDef::new(Bills::TaxAmount).decimal_len(14, 2).not_null())
                        .col(ColumnDef::new(Bills::Total).decimal_len(14, 2).not_null())
                        .col(ColumnDef::new(Bills::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Bills::PaidDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Bills::Notes).text().null())
                        .col(
                            ColumnDef::new(Bills::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bills::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bills_customer_id")
                                .from(Bills::Table, Bills::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bills_owner_bill_number")
                        .table(Bills::Table)
                        .col(Bills::OwnerId)
                        .col(Bills::BillNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bills_owner_issued_on")
                        .table(Bills::Table)
                        .col(Bills::OwnerId)
                        .col(Bills::IssuedOn)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bills_customer_id")
                        .table(Bills::Table)
                        .col(Bills::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bills::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Bills {
        Table,
        Id,
        OwnerId,
        CustomerId,
        BillNumber,
        IssuedOn,
        Subtotal,
        TaxRate,
        TaxAmount,
        Total,
        Status,
        PaidDate,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
    }
}

mod m20240601_000004_create_bill_line_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_bill_line_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BillLineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BillLineItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BillLineItems::BillId).uuid().not_null())
                        .col(
                            ColumnDef::new(BillLineItems::InventoryItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillLineItems::LineNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BillLineItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(BillLineItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillLineItems::Total)
                                .decimal_len(14, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillLineItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bill_line_items_bill_id")
                                .from(BillLineItems::Table, BillLineItems::BillId)
                                .to(Bills::Table, Bills::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bill_line_items_inventory_item_id")
                                .from(BillLineItems::Table, BillLineItems::InventoryItemId)
                                .to(InventoryItems::Table, InventoryItems::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bill_line_items_bill_id")
                        .table(BillLineItems::Table)
                        .col(BillLineItems::BillId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BillLineItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BillLineItems {
        Table,
        Id,
        BillId,
        InventoryItemId,
        LineNumber,
        Quantity,
        UnitPrice,
        Total,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Bills {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum InventoryItems {
        Table,
        Id,
    }
}

mod m20240601_000005_create_payments_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_payments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::BillId).uuid().not_null())
                        .col(ColumnDef::new(Payments::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal_len(14, 2).not_null())
                        .col(ColumnDef::new(Payments::PaymentDate).date().not_null())
                        .col(
                            ColumnDef::new(Payments::PaymentMethod)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Payments::Notes).text().null())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_bill_id")
                                .from(Payments::Table, Payments::BillId)
                                .to(Bills::Table, Bills::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_bill_id")
                        .table(Payments::Table)
                        .col(Payments::BillId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        BillId,
        OwnerId,
        Amount,
        PaymentDate,
        PaymentMethod,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Bills {
        Table,
        Id,
    }
}

mod m20240601_000006_create_bill_sequences_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000006_create_bill_sequences_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // One counter row per owner; bill numbers are allocated by incrementing it.
            manager
                .create_table(
                    Table::create()
                        .table(BillSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BillSequences::OwnerId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillSequences::LastNumber)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BillSequences::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BillSequences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BillSequences {
        Table,
        OwnerId,
        LastNumber,
        UpdatedAt,
    }
}
