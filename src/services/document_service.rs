// src/services/document_service.rs

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::sales::{SaleDetail, SaleStatus},
};

/// Conteúdo do QR code do recibo: identifica a venda sem expor dados do cliente.
pub fn receipt_reference(sale: &SaleDetail) -> String {
    format!("BSW-SALE:{}:{}", sale.header.display_id, sale.header.id)
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn status_label(status: SaleStatus) -> &'static str {
    match status {
        SaleStatus::Pending => "EM ABERTO",
        SaleStatus::Paid => "PAGO",
        SaleStatus::Cancelled => "CANCELADO",
    }
}

#[derive(Clone)]
pub struct DocumentService {
    business_name: String,
    fonts_dir: String,
}

impl DocumentService {
    pub fn new(business_name: String, fonts_dir: String) -> Self {
        Self { business_name, fonts_dir }
    }

    pub fn render_receipt(&self, sale: &SaleDetail) -> Result<Vec<u8>, AppError> {
        // 1. Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None)
            .map_err(|_| AppError::FontNotFound(format!("Roboto em {}", self.fonts_dir)))?;

        let header = &sale.header;
        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Recibo #{}", header.display_id));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(
            elements::Paragraph::new(self.business_name.clone())
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(elements::Break::new(1.5));

        doc.push(
            elements::Paragraph::new(format!("RECIBO #{}", header.display_id))
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Data: {}",
            header.created_at.format("%d/%m/%Y %H:%M")
        )));
        if let Some(table_number) = header.table_number {
            doc.push(elements::Paragraph::new(format!("Mesa: {}", table_number)));
        }
        doc.push(elements::Paragraph::new(format!(
            "Cliente: {}",
            header.customer_name.as_deref().unwrap_or("Consumidor Final")
        )));
        if let Some(server) = &sale.server_username {
            doc.push(elements::Paragraph::new(format!("Atendente: {}", server)));
        }
        doc.push(elements::Paragraph::new(format!("Situação: {}", status_label(header.status))));
        doc.push(elements::Break::new(2));

        // --- TABELA DE ITENS ---
        // Pesos das colunas: Nome (4), Qtd (1), Preço (2), Total (2)
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Produto").styled(style_bold))
            .element(elements::Paragraph::new("Qtd").styled(style_bold))
            .element(elements::Paragraph::new("Unitário").styled(style_bold))
            .element(elements::Paragraph::new("Total").styled(style_bold))
            .push()
            .map_err(|e| AppError::DocumentError(e.to_string()))?;

        for item in &sale.items {
            table
                .row()
                .element(elements::Paragraph::new(item.product_name.clone()))
                .element(elements::Paragraph::new(item.quantity.normalize().to_string()))
                .element(elements::Paragraph::new(money(item.unit_price)))
                .element(elements::Paragraph::new(money(item.total_price)))
                .push()
                .map_err(|e| AppError::DocumentError(e.to_string()))?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        // --- TOTAIS ---
        if header.discount_amount > Decimal::ZERO {
            let mut discount = elements::Paragraph::new(format!("Desconto: {}", money(header.discount_amount)));
            discount.set_alignment(genpdf::Alignment::Right);
            doc.push(discount);
        }
        let mut total_paragraph = elements::Paragraph::new(format!("TOTAL: {}", money(header.total_amount)));
        total_paragraph.set_alignment(genpdf::Alignment::Right);
        doc.push(total_paragraph.styled(style::Style::new().bold().with_font_size(12)));
        doc.push(elements::Break::new(2));

        // --- QR CODE DA VENDA ---
        let code = QrCode::new(receipt_reference(sale).as_bytes())
            .map_err(|e| AppError::DocumentError(e.to_string()))?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(|e| AppError::DocumentError(e.to_string()))?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);

        // 3. Renderiza para Buffer (Memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::DocumentError(e.to_string()))?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sales::Sale;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn detail() -> SaleDetail {
        SaleDetail {
            header: Sale {
                id: Uuid::nil(),
                display_id: 42,
                table_number: None,
                customer_name: None,
                server_id: None,
                status: SaleStatus::Paid,
                payment_method: None,
                discount_amount: dec!(0),
                total_amount: dec!(3000),
                notes: None,
                created_at: Utc::now(),
                paid_at: None,
                cancelled_at: None,
                cancel_reason: None,
            },
            server_username: None,
            items: Vec::new(),
        }
    }

    #[test]
    fn reference_carries_display_number_and_id() {
        assert_eq!(
            receipt_reference(&detail()),
            "BSW-SALE:42:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money(dec!(1500)), "1500.00");
        assert_eq!(money(dec!(2.345)), "2.34");
    }

    #[test]
    fn missing_font_is_reported() {
        let service = DocumentService::new("Bar".into(), "/nao/existe".into());
        assert!(matches!(
            service.render_receipt(&detail()),
            Err(AppError::FontNotFound(_))
        ));
    }
}
