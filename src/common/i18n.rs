// src/common/i18n.rs
//
// Catálogo de mensagens (inglês / tailandês) usado tanto nas respostas de
// sucesso quanto nos erros.

use crate::middleware::i18n::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    // --- Sucesso ---
    Fetched,
    Registered,
    LoggedIn,
    QuotationCreated,
    QuotationUpdated,
    QuotationDeleted,
    QuotationConverted,
    InvoiceAlreadyExists,
    QuotationApproved,
    QuotationRejected,
    InvoiceCreated,
    InvoiceUpdated,
    InvoiceDeleted,
    InvoiceStatusUpdated,
    PaymentRecorded,
    CustomerCreated,
    CustomerUpdated,
    CustomerDeleted,
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    SignatureAdded,
    ImageAdded,
    FileUploaded,
    FilesUploaded,
    FileDeleted,
    TemplateCreated,
    TemplateUpdated,
    TemplateDeleted,
    DefaultTemplateSet,
    RoleUpdated,
    PasswordResetRequested,
    ResetTokenValid,
    PasswordChanged,
    VerificationSent,
    EmailVerified,

    // --- Validação ---
    InvalidInput,
    ItemsRequired,
    InvalidQuantity,
    NegativeUnitPrice,
    NegativeDiscount,
    VatOutOfRange,
    DiscountExceedsSubtotal,
    AmountOutOfRange,
    TooManyDecimals,
    PaymentAmountRequired,
    PaymentExceedsBalance,
    CustomerNameRequired,
    CannotSetConverted,
    InvalidStatus,
    InvalidFileType,
    FileTooLarge,
    TooManyFiles,
    NoFileUploaded,
    InvalidFilename,
    EmailAlreadyExists,
    InvalidAccountToken,
    TokenExpired,
    TokenAlreadyUsed,

    // --- Conflitos de estado ---
    ConvertedWithoutInvoice,
    AlreadyDecided,
    QuotationAlreadyConverted,
    EmailAlreadyVerified,

    // --- Não encontrado ---
    QuotationNotFound,
    InvoiceNotFound,
    ReceiptNotFound,
    CustomerNotFound,
    ProductNotFound,
    TemplateNotFound,
    UserNotFound,
    FileNotFound,

    // --- Autenticação ---
    InvalidCredentials,
    InvalidToken,
    Forbidden,

    // --- Interno ---
    PdfUnavailable,
    Unexpected,
}

impl Msg {
    pub fn text(self, locale: &Locale) -> &'static str {
        let (en, th) = self.texts();
        if locale.is_thai() { th } else { en }
    }

    fn texts(self) -> (&'static str, &'static str) {
        use Msg::*;
        match self {
            Fetched => ("Fetched successfully", "ดึงข้อมูลสำเร็จ"),
            Registered => ("Registration successful", "ลงทะเบียนสำเร็จ"),
            LoggedIn => ("Login successful", "เข้าสู่ระบบสำเร็จ"),
            QuotationCreated => ("Quotation created", "สร้างใบเสนอราคาสำเร็จ"),
            QuotationUpdated => ("Quotation updated", "อัปเดตใบเสนอราคาสำเร็จ"),
            QuotationDeleted => ("Quotation deleted", "ลบใบเสนอราคาสำเร็จ"),
            QuotationConverted => ("Quotation converted to invoice", "แปลงใบเสนอราคาเป็นใบแจ้งหนี้สำเร็จ"),
            InvoiceAlreadyExists => (
                "An invoice already exists for this quotation",
                "ใบเสนอราคานี้ถูกแปลงเป็นใบแจ้งหนี้แล้ว",
            ),
            QuotationApproved => ("Quotation approved", "อนุมัติใบเสนอราคาสำเร็จ"),
            QuotationRejected => ("Quotation rejected", "ปฏิเสธใบเสนอราคาแล้ว"),
            InvoiceCreated => ("Invoice created", "สร้างใบแจ้งหนี้สำเร็จ"),
            InvoiceUpdated => ("Invoice updated", "อัปเดตใบแจ้งหนี้สำเร็จ"),
            InvoiceDeleted => ("Invoice deleted", "ลบใบแจ้งหนี้สำเร็จ"),
            InvoiceStatusUpdated => ("Invoice status updated", "อัปเดตสถานะใบแจ้งหนี้สำเร็จ"),
            PaymentRecorded => ("Payment recorded", "บันทึกการชำระเงินสำเร็จ"),
            CustomerCreated => ("Customer created", "เพิ่มลูกค้าสำเร็จ"),
            CustomerUpdated => ("Customer updated", "อัปเดตข้อมูลลูกค้าสำเร็จ"),
            CustomerDeleted => ("Customer deleted", "ลบลูกค้าสำเร็จ"),
            ProductCreated => ("Product created", "เพิ่มสินค้าสำเร็จ"),
            ProductUpdated => ("Product updated", "อัปเดตสินค้าสำเร็จ"),
            ProductDeleted => ("Product deactivated", "ปิดการใช้งานสินค้าสำเร็จ"),
            SignatureAdded => ("Signature added", "เพิ่มลายเซ็นสำเร็จ"),
            ImageAdded => ("Image attached", "แนบรูปภาพสำเร็จ"),
            FileUploaded => ("File uploaded", "อัปโหลดไฟล์สำเร็จ"),
            FilesUploaded => ("Files uploaded", "อัปโหลดไฟล์ทั้งหมดสำเร็จ"),
            FileDeleted => ("File deleted", "ลบไฟล์สำเร็จ"),
            TemplateCreated => ("Signature template created", "สร้างเทมเพลตลายเซ็นสำเร็จ"),
            TemplateUpdated => ("Signature template updated", "อัปเดตเทมเพลตลายเซ็นสำเร็จ"),
            TemplateDeleted => ("Signature template deleted", "ลบเทมเพลตลายเซ็นสำเร็จ"),
            DefaultTemplateSet => ("Default signature template set", "ตั้งค่าเทมเพลตเริ่มต้นสำเร็จ"),
            RoleUpdated => ("User role updated", "อัปเดตสิทธิ์ผู้ใช้สำเร็จ"),
            PasswordResetRequested => (
                "If the email is registered, a password reset link has been sent",
                "หากอีเมลมีอยู่ในระบบ เราจะส่งลิงก์รีเซ็ตรหัสผ่านให้",
            ),
            ResetTokenValid => ("Reset token is valid", "Token ถูกต้อง"),
            PasswordChanged => ("Password changed", "เปลี่ยนรหัสผ่านสำเร็จ"),
            VerificationSent => (
                "If the account needs it, a verification email has been sent",
                "ส่งอีเมลยืนยันเรียบร้อยแล้ว",
            ),
            EmailVerified => ("Email verified", "ยืนยันอีเมลสำเร็จ"),

            InvalidInput => ("Invalid input", "ข้อมูลไม่ถูกต้อง"),
            ItemsRequired => ("At least one item is required", "ต้องมีรายการสินค้าอย่างน้อย 1 รายการ"),
            InvalidQuantity => ("Item quantity must be greater than zero", "จำนวนสินค้าต้องมากกว่า 0"),
            NegativeUnitPrice => ("Item price cannot be negative", "ราคาสินค้าต้องไม่ติดลบ"),
            NegativeDiscount => ("Discount cannot be negative", "ส่วนลดต้องไม่ติดลบ"),
            VatOutOfRange => ("VAT must be between 0 and 100", "ภาษีมูลค่าเพิ่มต้องอยู่ระหว่าง 0 ถึง 100"),
            DiscountExceedsSubtotal => ("Discount cannot exceed the subtotal", "ส่วนลดต้องไม่เกินยอดรวม"),
            AmountOutOfRange => (
                "Amount is too large (must be below 1,000,000,000,000)",
                "จำนวนเงินมากเกินไป (ต้องน้อยกว่า 1,000,000,000,000)",
            ),
            TooManyDecimals => (
                "Amounts accept at most 2 decimal places",
                "จำนวนเงินมีทศนิยมได้ไม่เกิน 2 ตำแหน่ง",
            ),
            PaymentAmountRequired => (
                "Must specify a positive payment amount",
                "กรุณาระบุจำนวนเงินที่ชำระมากกว่า 0",
            ),
            PaymentExceedsBalance => (
                "Payment exceeds the remaining balance",
                "จำนวนเงินที่ชำระเกินยอดคงเหลือ",
            ),
            CustomerNameRequired => ("Customer name is required", "กรุณาระบุชื่อลูกค้า"),
            CannotSetConverted => (
                "A quotation only becomes converted by converting it to an invoice",
                "ใบเสนอราคาจะเปลี่ยนเป็นสถานะแปลงแล้วได้ผ่านการแปลงเป็นใบแจ้งหนี้เท่านั้น",
            ),
            InvalidStatus => ("Invalid status filter", "สถานะไม่ถูกต้อง"),
            InvalidFileType => (
                "Only image files are allowed (jpeg, jpg, png, gif, webp)",
                "อนุญาตเฉพาะไฟล์รูปภาพเท่านั้น (jpeg, jpg, png, gif, webp)",
            ),
            FileTooLarge => ("File is too large (max 5MB)", "ไฟล์มีขนาดใหญ่เกินไป (สูงสุด 5MB)"),
            TooManyFiles => ("Too many files (max 10)", "จำนวนไฟล์เกินกำหนด (สูงสุด 10 ไฟล์)"),
            NoFileUploaded => ("No file uploaded", "ไม่พบไฟล์ที่อัปโหลด"),
            InvalidFilename => ("Invalid filename", "ชื่อไฟล์ไม่ถูกต้อง"),
            EmailAlreadyExists => ("Email is already registered", "อีเมลนี้ถูกใช้งานแล้ว"),
            InvalidAccountToken => ("Invalid or expired token", "Token ไม่ถูกต้องหรือหมดอายุ"),
            TokenExpired => ("Token has expired, please request a new one", "Token หมดอายุ กรุณาขอใหม่อีกครั้ง"),
            TokenAlreadyUsed => ("Token has already been used", "Token นี้ถูกใช้งานแล้ว"),

            ConvertedWithoutInvoice => (
                "Quotation is marked as converted but has no invoice",
                "ใบเสนอราคาถูกแปลงแล้วแต่ไม่พบใบแจ้งหนี้",
            ),
            AlreadyDecided => (
                "This quotation has already been approved or rejected",
                "ใบเสนอราคานี้ได้รับการพิจารณาแล้ว",
            ),
            QuotationAlreadyConverted => (
                "A converted quotation cannot change items, totals or status",
                "ใบเสนอราคาที่แปลงแล้วไม่สามารถแก้ไขรายการ ยอดเงิน หรือสถานะได้",
            ),
            EmailAlreadyVerified => ("Email is already verified", "อีเมลได้รับการยืนยันแล้ว"),

            QuotationNotFound => ("Quotation not found", "ไม่พบใบเสนอราคา"),
            InvoiceNotFound => ("Invoice not found", "ไม่พบใบแจ้งหนี้"),
            ReceiptNotFound => ("Receipt not found", "ไม่พบใบเสร็จรับเงิน"),
            CustomerNotFound => ("Customer not found", "ไม่พบลูกค้า"),
            ProductNotFound => ("Product not found", "ไม่พบสินค้า"),
            TemplateNotFound => ("Signature template not found", "ไม่พบเทมเพลตลายเซ็น"),
            UserNotFound => ("User not found", "ไม่พบผู้ใช้"),
            FileNotFound => ("File not found", "ไม่พบไฟล์"),

            InvalidCredentials => ("Invalid email or password", "อีเมลหรือรหัสผ่านไม่ถูกต้อง"),
            InvalidToken => (
                "Missing or invalid authentication token",
                "ไม่ได้รับอนุญาต กรุณาเข้าสู่ระบบ",
            ),
            Forbidden => ("Admin access required", "ต้องเป็นผู้ดูแลระบบเท่านั้น"),

            PdfUnavailable => ("PDF could not be generated", "ไม่สามารถสร้างไฟล์ PDF ได้"),
            Unexpected => ("An unexpected error occurred", "เกิดข้อผิดพลาดภายในระบบ"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thai_locale_gets_thai_text() {
        let th = Locale("th".into());
        assert_eq!(Msg::QuotationNotFound.text(&th), "ไม่พบใบเสนอราคา");
        assert_eq!(Msg::QuotationNotFound.text(&Locale::default()), "Quotation not found");
    }

    #[test]
    fn unknown_languages_fall_back_to_english() {
        let pt = Locale("pt".into());
        assert_eq!(Msg::PaymentAmountRequired.text(&pt), "Must specify a positive payment amount");
    }
}
