//! Source Buffer
//!
//! Holds the current component source. Replaced wholesale on every edit; no
//! history and no validation.

/// The sample shown on first load.
pub const DEFAULT_COMPONENT_SOURCE: &str = r##"function Component() {
  return (
    <div className="relative flex min-h-screen flex-col justify-center overflow-hidden bg-gray-50 py-6 sm:py-12">
      <div className="relative bg-white px-6 pt-10 pb-8 shadow-xl ring-1 ring-gray-900/5 sm:mx-auto sm:max-w-lg sm:rounded-lg sm:px-10">
        <div className="mx-auto max-w-md">
          <h1 className="text-3xl font-bold mb-4 text-center">Invoice</h1>
          <div className="mb-6">
            <p className="text-sm text-gray-600">Invoice #: INV-2023-001</p>
            <p className="text-sm text-gray-600">Date: May 15, 2023</p>
          </div>
          <div className="mb-6">
            <h2 className="text-lg font-semibold mb-2">Bill To:</h2>
            <p className="text-sm">John Doe</p>
            <p className="text-sm">123 Main St</p>
            <p className="text-sm">Anytown, ST 12345</p>
            <p className="text-sm">johndoe@example.com</p>
          </div>
          <div className="divide-y divide-gray-300/50">
            <div className="space-y-6 py-8 text-base leading-7 text-gray-600">
              <table className="w-full text-sm">
                <thead>
                  <tr className="border-b">
                    <th className="text-left py-2">Description</th>
                    <th className="text-right py-2">Quantity</th>
                    <th className="text-right py-2">Unit Price</th>
                    <th className="text-right py-2">Amount</th>
                  </tr>
                </thead>
                <tbody>
                  <tr>
                    <td className="py-2">Web Design Services</td>
                    <td className="text-right">1</td>
                    <td className="text-right">$1,000.00</td>
                    <td className="text-right">$1,000.00</td>
                  </tr>
                  <tr>
                    <td className="py-2">Logo Design</td>
                    <td className="text-right">1</td>
                    <td className="text-right">$500.00</td>
                    <td className="text-right">$500.00</td>
                  </tr>
                  <tr>
                    <td className="py-2">Hosting (12 months)</td>
                    <td className="text-right">12</td>
                    <td className="text-right">$20.00</td>
                    <td className="text-right">$240.00</td>
                  </tr>
                </tbody>
              </table>
              <div className="pt-4 border-t border-gray-300">
                <p className="flex justify-between">
                  <span className="font-semibold">Subtotal:</span>
                  <span>$1,740.00</span>
                </p>
                <p className="flex justify-between">
                  <span className="font-semibold">Tax (10%):</span>
                  <span>$174.00</span>
                </p>
                <p className="flex justify-between text-lg font-bold mt-2">
                  <span>Total:</span>
                  <span>$1,914.00</span>
                </p>
              </div>
            </div>
            <div className="pt-8 text-base font-semibold leading-7">
              <p className="text-gray-900 mb-2">Payment Terms: Due within 30 days</p>
              <p className="text-sm text-gray-600 mb-4">Please make checks payable to: Your Company Name</p>
              <p className="text-gray-900">Questions about this invoice?</p>
              <p>
                <a href="#" className="text-blue-500 hover:text-blue-600">Contact our billing department &rarr;</a>
              </p>
            </div>
          </div>
        </div>
      </div>
    </div>
  );
}"##;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    text: String,
    revision: u64,
}

impl Default for SourceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_COMPONENT_SOURCE)
    }
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revision: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Incremented on every replacement, so hosts can match results to edits.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the held text unconditionally.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_invoice_sample() {
        let buffer = SourceBuffer::default();
        assert!(buffer.text().starts_with("function Component()"));
        assert!(buffer.text().contains("Invoice"));
        assert_eq!(buffer.revision(), 0);
    }

    #[test]
    fn test_set_text_bumps_revision() {
        let mut buffer = SourceBuffer::default();
        buffer.set_text("a");
        buffer.set_text("a");
        assert_eq!(buffer.text(), "a");
        assert_eq!(buffer.revision(), 2);
    }
}
